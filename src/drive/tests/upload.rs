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

use drive_upload::client::Drive;
use drive_upload::model::UploadMetadata;
use drive_upload::retry_policy::RetryableErrors;
use gax::exponential_backoff::ExponentialBackoffBuilder;
use gax::retry_policy::RetryPolicyExt;
use httptest::{Expectation, Server, matchers::*, responders::*};
use serde_json::json;
use std::io::Write;
use std::time::Duration;

type Result = anyhow::Result<()>;

const QUANTUM: usize = 256 * 1024;

fn response_body() -> String {
    json!({
        "kind": "drive#file",
        "id": "file-001",
        "name": "test-file",
        "mimeType": "application/octet-stream",
    })
    .to_string()
}

async fn test_client(server: &Server) -> anyhow::Result<Drive> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        reqwest::header::HeaderValue::from_static("Bearer test-only-token"),
    );
    let http = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let client = Drive::builder()
        .with_endpoint(format!("http://{}", server.addr()))
        .with_http_client(http)
        .with_backoff_policy(
            ExponentialBackoffBuilder::new()
                .with_initial_delay(Duration::from_millis(1))
                .with_maximum_delay(Duration::from_millis(2))
                .build()?,
        )
        .build()
        .await?;
    Ok(client)
}

#[tokio::test]
async fn upload_from_file() -> Result {
    let server = Server::run();
    let session = server.url("/upload/session/test-only-001");
    let path = session.path().to_string();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/upload/drive/v3/files"),
            request::query(url_decoded(contains(("uploadType", "resumable")))),
            request::headers(contains(("authorization", "Bearer test-only-token"))),
            request::headers(contains(("x-upload-content-length", "524388"))),
            request::body(json_decoded(eq(json!({
                "name": "test-file",
                "parents": ["folder-001"],
                "mimeType": "application/octet-stream",
            })))),
        ])
        .times(1)
        .respond_with(status_code(200).append_header("location", session.to_string())),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("PUT", path.clone()),
            request::headers(contains(("authorization", "Bearer test-only-token"))),
            request::headers(contains(("content-range", "bytes 0-262143/524388"))),
        ])
        .times(1)
        .respond_with(status_code(308).append_header("range", "bytes=0-262143")),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("PUT", path.clone()),
            request::headers(contains(("content-range", "bytes 262144-524287/524388"))),
        ])
        .times(1)
        .respond_with(status_code(308).append_header("range", "bytes=0-524287")),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("PUT", path.clone()),
            request::headers(contains(("content-range", "bytes 524288-524387/524388"))),
        ])
        .times(1)
        .respond_with(status_code(201).body(response_body())),
    );

    let mut file = tempfile::NamedTempFile::new()?;
    let data = (0..2 * QUANTUM + 100)
        .map(|i| (i % 251) as u8)
        .collect::<Vec<_>>();
    file.write_all(&data)?;
    file.flush()?;
    let source = tokio::fs::File::open(file.path()).await?;

    let client = test_client(&server).await?;
    let metadata = UploadMetadata::new("test-file", data.len() as u64)
        .set_parents(["folder-001"])
        .set_mime_type("application/octet-stream");
    let uploaded = client
        .upload_file(metadata, source)
        .with_chunk_size(QUANTUM)
        .send()
        .await?;
    assert_eq!(uploaded.status, 201);
    assert_eq!(uploaded.id().as_deref(), Some("file-001"));
    Ok(())
}

#[tokio::test]
async fn upload_with_transient_errors() -> Result {
    let server = Server::run();
    let session = server.url("/upload/session/test-only-001");
    let path = session.path().to_string();
    server.expect(
        Expectation::matching(request::method_path("POST", "/upload/drive/v3/files"))
            .times(1)
            .respond_with(status_code(200).append_header("location", session.to_string())),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("PUT", path.clone()),
            request::headers(contains(("content-range", "bytes 0-5/6"))),
        ])
        .times(3)
        .respond_with(cycle![
            status_code(503).body("try-again"),
            status_code(500).body("try-again"),
            status_code(200).body(response_body()),
        ]),
    );

    let client = test_client(&server).await?;
    let uploaded = client
        .upload_file(UploadMetadata::new("test-file", 6), "abcdef".as_bytes())
        .with_retry_policy(RetryableErrors.with_attempt_limit(3))
        .send()
        .await?;
    assert_eq!(uploaded.id().as_deref(), Some("file-001"));
    Ok(())
}

#[tokio::test]
async fn concurrent_uploads() -> Result {
    let server = Server::run();
    let sessions = [
        server.url("/upload/session/test-only-001"),
        server.url("/upload/session/test-only-002"),
    ];
    server.expect(
        Expectation::matching(request::method_path("POST", "/upload/drive/v3/files"))
            .times(2)
            .respond_with(cycle![
                status_code(200).append_header("location", sessions[0].to_string()),
                status_code(200).append_header("location", sessions[1].to_string()),
            ]),
    );
    for session in &sessions {
        let path = session.path().to_string();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PUT", path.clone()),
                request::headers(contains(("content-range", "bytes 0-3/6"))),
            ])
            .times(1)
            .respond_with(status_code(308).append_header("range", "bytes=0-3")),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PUT", path.clone()),
                request::headers(contains(("content-range", "bytes 4-5/6"))),
            ])
            .times(1)
            .respond_with(status_code(200).body(response_body())),
        );
    }

    let client = test_client(&server).await?;
    let (a, b) = tokio::join!(
        client
            .upload_file(UploadMetadata::new("file-a", 6), "abcdef".as_bytes())
            .with_chunk_size(4)
            .send(),
        client
            .upload_file(UploadMetadata::new("file-b", 6), "ghijkl".as_bytes())
            .with_chunk_size(4)
            .send(),
    );
    assert_eq!(a?.status, 200);
    assert_eq!(b?.status, 200);
    Ok(())
}

#[tokio::test]
async fn upload_rejected() -> Result {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/upload/drive/v3/files"))
            .times(1)
            .respond_with(status_code(403).body("permission denied")),
    );

    let client = test_client(&server).await?;
    let err = client
        .upload_file(UploadMetadata::new("test-file", 6), "abcdef".as_bytes())
        .send()
        .await
        .expect_err("403 creating a session is an error");
    assert!(err.is_authentication(), "{err:?}");
    assert_eq!(err.http_status_code(), Some(403), "{err:?}");
    Ok(())
}
