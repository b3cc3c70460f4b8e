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

//! The input into retry and backoff policy queries.

use std::time::Instant;

/// Describes the retry loop when a policy is queried.
///
/// Each chunk upload runs its own retry loop. The loop creates a new
/// [RetryState] when it starts, and updates the attempt count after each
/// failure.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct RetryState {
    /// If true, the request is safe to send more than once.
    ///
    /// Chunk uploads declare their byte range explicitly, so they are always
    /// idempotent. Starting an upload session is not.
    pub idempotent: bool,

    /// When the retry loop started.
    pub start: Instant,

    /// The number of attempts so far, including the one that just failed.
    pub attempt_count: u32,
}

impl RetryState {
    /// Creates a new instance, starting now with no attempts.
    pub fn new(idempotent: bool) -> Self {
        Self {
            idempotent,
            start: Instant::now(),
            attempt_count: 0,
        }
    }

    /// Changes the start time, useful in tests.
    pub fn set_start<T: Into<Instant>>(mut self, v: T) -> Self {
        self.start = v.into();
        self
    }

    /// Changes the attempt count, useful in tests.
    pub fn set_attempt_count<T: Into<u32>>(mut self, v: T) -> Self {
        self.attempt_count = v.into();
        self
    }
}
