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

use super::client::DriveInner;
use super::request_options::{RequestOptions, validate_chunk_size};
use crate::error::UploadError;
use crate::model::{UploadMetadata, UploadedFile};
use crate::retry_policy::TransientOnly;
use crate::{Error, Result};
use chunk::{ChunkBuffer, ChunkFiller};
use gax::retry_loop_internal::{effective_timeout, retry_loop_with_callback};
use put_chunk::{ChunkUploader, Progress};
use state::UploadState;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

mod chunk;
mod put_chunk;
mod session;
mod state;

/// Runs a resumable upload from start to finish.
///
/// The upload creates one session, then sends the source in chunks, one
/// request at a time and in offset order. The service must confirm each chunk
/// exactly before the next one is read from the source.
pub struct PerformUpload<S> {
    inner: Arc<DriveInner>,
    metadata: UploadMetadata,
    source: S,
    options: RequestOptions,
    cancel: CancellationToken,
}

impl<S> PerformUpload<S>
where
    S: AsyncRead + Unpin + Send,
{
    pub(crate) fn new(
        inner: Arc<DriveInner>,
        metadata: UploadMetadata,
        source: S,
        options: RequestOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner,
            metadata,
            source,
            options,
            cancel,
        }
    }

    pub(crate) async fn send(self) -> Result<UploadedFile> {
        let Self {
            inner,
            metadata,
            source,
            options,
            cancel,
        } = self;
        let chunk_size = validate_chunk_size(options.chunk_size)?;
        if cancel.is_cancelled() {
            return Err(Error::cancelled());
        }
        // Creating a session is not retried. A failure here leaves nothing
        // behind, the application can start over.
        let session = session::initiate(&inner, &metadata, options.request_timeout).await?;
        tracing::info!(
            "started upload session for {} ({} bytes)",
            metadata.name,
            metadata.size
        );

        let uploader = ChunkUploader::new(&inner, &session);
        let mut filler = ChunkFiller::new(source, chunk_size);
        let mut state = UploadState::new(metadata.size);
        loop {
            if cancel.is_cancelled() {
                return Err(Error::cancelled());
            }
            let (chunk, is_final) = filler.next_chunk().await?;
            let start = state.confirmed_offset();
            let total = state.total_size();
            let len = chunk.len() as u64;
            check_chunk(start, len, total, is_final)?;
            let progress =
                upload_with_retry(&uploader, &chunk, start, total, &options, &cancel).await?;
            match progress {
                Progress::Complete(file) => {
                    if start + len < total {
                        tracing::warn!(
                            "the service finalized the upload at offset {}, before all {total} bytes were sent",
                            start + len
                        );
                    }
                    let state = state.complete(file.status, len);
                    tracing::info!(
                        "upload finished with status {:?}, {} of {total} bytes sent",
                        state.last_status(),
                        state.confirmed_offset()
                    );
                    return Ok(file);
                }
                Progress::Partial(end) => {
                    state = state.advance(len, end)?;
                    tracing::debug!("chunk confirmed: {state:?}");
                    if is_final {
                        // The service expects more data, but the source has
                        // nothing left.
                        return Err(Error::integrity(UploadError::SizeMismatch {
                            declared: total,
                            read: state.confirmed_offset(),
                        }));
                    }
                }
            }
        }
    }
}

/// Verifies the chunk fits in the declared size before it is sent.
fn check_chunk(start: u64, len: u64, total: u64, is_final: bool) -> Result<()> {
    let end = start + len;
    if end > total || (end == total && !is_final) {
        // The filler reads one byte past any chunk that is not final.
        let read = if is_final { end } else { end + 1 };
        return Err(Error::integrity(UploadError::SizeMismatch {
            declared: total,
            read,
        }));
    }
    if is_final && end < total {
        return Err(Error::integrity(UploadError::SizeMismatch {
            declared: total,
            read: end,
        }));
    }
    Ok(())
}

async fn upload_with_retry(
    uploader: &ChunkUploader<'_>,
    chunk: &ChunkBuffer,
    start: u64,
    total: u64,
    options: &RequestOptions,
    cancel: &CancellationToken,
) -> Result<Progress> {
    let attempt_timeout = options.request_timeout;
    let inner = async |remaining: Option<Duration>| {
        if cancel.is_cancelled() {
            return Err(Error::cancelled());
        }
        let timeout = effective_timeout(Some(attempt_timeout), remaining);
        uploader
            .upload_chunk(chunk, start, total, timeout)
            .await
            .into_result()
    };
    let sleep = async |delay: Duration| {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {},
            _ = cancel.cancelled() => {},
        }
    };
    retry_loop_with_callback(
        inner,
        sleep,
        true,
        Arc::new(TransientOnly::new(options.retry_policy.clone())),
        options.backoff_policy.clone(),
        |attempt, error, delay| {
            tracing::warn!(
                "chunk at offset {start} failed on attempt {attempt}, retrying in {delay:?}: {error}"
            )
        },
    )
    .await
}

/// The details of an unsuccessful response.
struct ResponseDetails {
    status: u16,
    headers: http::HeaderMap,
    payload: bytes::Bytes,
}

impl ResponseDetails {
    async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        // The payload is only used in error messages.
        let payload = match response.bytes().await {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!("cannot read the body of the [{status}] response: {e}");
                bytes::Bytes::new()
            }
        };
        Self {
            status,
            headers,
            payload,
        }
    }
}

fn send_err(err: reqwest::Error) -> Error {
    match err {
        e if e.is_timeout() => Error::timeout(e),
        e => Error::io(e),
    }
}

const RESUME_INCOMPLETE: reqwest::StatusCode = reqwest::StatusCode::PERMANENT_REDIRECT;
