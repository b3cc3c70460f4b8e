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

use super::chunk::ChunkBuffer;
use super::session::UploadSession;
use super::{RESUME_INCOMPLETE, ResponseDetails, send_err};
use crate::drive::client::DriveInner;
use crate::error::ProtocolError;
use crate::model::UploadedFile;
use crate::{Error, Result};
use std::time::Duration;

/// The classified response to a single chunk request.
#[derive(Debug)]
pub enum ChunkOutcome {
    /// The service persisted bytes up to (and including) this offset and
    /// expects more data.
    ResumeIncomplete(u64),
    /// The service finalized the upload.
    Complete(UploadedFile),
    /// The request may succeed if sent again.
    Retryable(Error),
    /// The upload cannot continue.
    Fatal(Error),
}

impl ChunkOutcome {
    /// Converts the outcome for use in the retry loop.
    ///
    /// Both `Retryable` and `Fatal` map to errors. Only the former are
    /// transient, so the retry policy can tell them apart.
    pub fn into_result(self) -> Result<Progress> {
        match self {
            Self::ResumeIncomplete(n) => Ok(Progress::Partial(n)),
            Self::Complete(f) => Ok(Progress::Complete(f)),
            Self::Retryable(e) | Self::Fatal(e) => Err(e),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Progress {
    Partial(u64),
    Complete(UploadedFile),
}

/// Sends chunks to an upload session.
pub struct ChunkUploader<'a> {
    inner: &'a DriveInner,
    session: &'a UploadSession,
}

impl<'a> ChunkUploader<'a> {
    pub fn new(inner: &'a DriveInner, session: &'a UploadSession) -> Self {
        Self { inner, session }
    }

    /// Sends `chunk` as the bytes starting at `start`.
    ///
    /// The request is never sent more than once, the caller retries as needed.
    pub async fn upload_chunk(
        &self,
        chunk: &ChunkBuffer,
        start: u64,
        total: u64,
        timeout: Option<Duration>,
    ) -> ChunkOutcome {
        let range = content_range(start, chunk.len() as u64, total);
        if chunk.is_empty() {
            tracing::debug!("finalizing empty upload with Content-Range: {range}");
        } else {
            tracing::debug!("sending chunk with Content-Range: {range}");
        }
        let builder = self
            .inner
            .client
            .request(reqwest::Method::PUT, self.session.url().clone())
            .header("content-type", "application/octet-stream")
            .header("content-range", range)
            .body(chunk.body());
        let builder = timeout.into_iter().fold(builder, |b, t| b.timeout(t));
        match builder.send().await {
            Ok(response) => classify_response(response).await,
            Err(e) => ChunkOutcome::Retryable(send_err(e)),
        }
    }
}

async fn classify_response(response: reqwest::Response) -> ChunkOutcome {
    let status = response.status();
    if status == RESUME_INCOMPLETE {
        return match parse_range_end(response.headers()) {
            Ok(end) => ChunkOutcome::ResumeIncomplete(end),
            Err(e) => ChunkOutcome::Fatal(Error::protocol(e)),
        };
    }
    if status == reqwest::StatusCode::OK || status == reqwest::StatusCode::CREATED {
        return match response.bytes().await {
            Ok(payload) => ChunkOutcome::Complete(UploadedFile::new(status.as_u16(), payload)),
            Err(e) => ChunkOutcome::Retryable(send_err(e)),
        };
    }
    let ResponseDetails {
        status,
        headers,
        payload,
    } = ResponseDetails::from_response(response).await;
    if (500..600).contains(&status) {
        return ChunkOutcome::Retryable(Error::http(status, headers, payload));
    }
    ChunkOutcome::Fatal(Error::rejected(status, headers, payload))
}

/// Formats the `Content-Range` header for a chunk of `len` bytes.
///
/// An empty chunk carries no range, only the total size. This is only used
/// to finalize an empty upload.
fn content_range(start: u64, len: u64, total: u64) -> String {
    match len {
        0 => format!("bytes */{total}"),
        n => format!("bytes {start}-{}/{total}", start + n - 1),
    }
}

/// Returns the last byte persisted by the service.
///
/// Uploads are sequential, the persisted range always starts at zero.
fn parse_range_end(
    headers: &reqwest::header::HeaderMap,
) -> std::result::Result<u64, ProtocolError> {
    let range = headers
        .get(reqwest::header::RANGE)
        .ok_or(ProtocolError::MissingHeader("Range"))?;
    let end = range
        .as_bytes()
        .strip_prefix(b"bytes=0-")
        .ok_or_else(|| ProtocolError::BadHeaderFormat("Range", "missing bytes=0- prefix".into()))?;
    let end = std::str::from_utf8(end)
        .map_err(|e| ProtocolError::BadHeaderFormat("Range", e.into()))?;
    end.parse::<u64>()
        .map_err(|e| ProtocolError::BadHeaderFormat("Range", e.into()))
}
