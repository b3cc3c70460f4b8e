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

use crate::error::UploadError;
use crate::{Error, Result};

/// Tracks the progress of an upload session.
///
/// Transitions consume the state and return the next one, the orchestrator
/// never holds a stale copy.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadState {
    confirmed_offset: u64,
    total_size: u64,
    last_status: Option<u16>,
}

impl UploadState {
    pub fn new(total_size: u64) -> Self {
        Self {
            confirmed_offset: 0,
            total_size,
            last_status: None,
        }
    }

    /// The number of bytes persisted by the service.
    pub fn confirmed_offset(&self) -> u64 {
        self.confirmed_offset
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn last_status(&self) -> Option<u16> {
        self.last_status
    }

    /// Records a `308 Resume Incomplete` response to a chunk of `len` bytes.
    ///
    /// `range_end` is the last byte offset the service confirmed. It must be
    /// the last byte of the chunk, anything else aborts the upload.
    pub fn advance(self, len: u64, range_end: u64) -> Result<Self> {
        let end = self.confirmed_offset + len;
        if end == 0 {
            // Nothing was sent and the service confirmed at least one byte.
            return Err(Error::integrity(UploadError::TooMuchProgress {
                sent: 0,
                persisted: range_end.saturating_add(1),
            }));
        }
        let expected = end - 1;
        if range_end < expected {
            return Err(Error::integrity(UploadError::UnexpectedOffset {
                expected,
                confirmed: range_end,
            }));
        }
        if range_end > expected {
            return Err(Error::integrity(UploadError::TooMuchProgress {
                sent: end,
                persisted: range_end.saturating_add(1),
            }));
        }
        Ok(Self {
            confirmed_offset: range_end + 1,
            last_status: Some(reqwest::StatusCode::PERMANENT_REDIRECT.as_u16()),
            ..self
        })
    }

    /// Records the response that finalized the upload, after sending a chunk
    /// of `len` bytes.
    pub fn complete(self, status: u16, len: u64) -> Self {
        Self {
            confirmed_offset: self.confirmed_offset + len,
            last_status: Some(status),
            ..self
        }
    }
}
