// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Uploads a file to Google Drive using resumable uploads.

mod args;

use args::Args;
use clap::Parser;
use drive_upload::client::Drive;
use drive_upload::model::UploadMetadata;
use drive_upload::retry_policy::RetryableErrors;
use gax::retry_policy::RetryPolicyExt;
use tokio_util::sync::CancellationToken;

const DESCRIPTION: &str = concat!(
    "This program uploads a file to Google Drive.",
    " The file is sent in chunks, transient errors resend the current chunk."
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    args.validate()?;
    enable_tracing(&args);

    let name = args.file_name()?;
    let source = tokio::fs::File::open(&args.file).await?;
    let size = source.metadata().await?.len();
    tracing::info!("uploading {:?} as {name}, {size} bytes", args.file);

    let client = make_client(&args).await?;
    let metadata = UploadMetadata::new(name, size).set_parents(args.parent.clone());
    let metadata = args
        .mime_type
        .iter()
        .fold(metadata, |m, v| m.set_mime_type(v));
    let metadata = args
        .description
        .iter()
        .fold(metadata, |m, v| m.set_description(v));

    let cancel = CancellationToken::new();
    let _interrupt = tokio::spawn(cancel_on_interrupt(cancel.clone()));
    let uploaded = client
        .upload_file(metadata, source)
        .with_cancellation_token(cancel)
        .send()
        .await?;
    match uploaded.id() {
        Some(id) => println!("{id}"),
        None => println!("{}", String::from_utf8_lossy(&uploaded.payload)),
    }
    Ok(())
}

async fn make_client(args: &Args) -> anyhow::Result<Drive> {
    let mut authorization =
        reqwest::header::HeaderValue::from_str(&format!("Bearer {}", args.access_token))?;
    authorization.set_sensitive(true);
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(reqwest::header::AUTHORIZATION, authorization);
    let http = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let builder = Drive::builder()
        .with_http_client(http)
        .with_chunk_size(args.chunk_size)
        .with_request_timeout(args.timeout)
        .with_retry_policy(RetryableErrors.with_attempt_limit(args.max_attempts));
    let builder = args
        .endpoint
        .iter()
        .fold(builder, |b, v| b.with_endpoint(v));
    Ok(builder.build().await?)
}

async fn cancel_on_interrupt(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupted, the upload stops before the next chunk");
        cancel.cancel();
    }
}

fn enable_tracing(args: &Args) {
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = tracing_subscriber::fmt()
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting global subscriber succeeds");
}
