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

use gax::{backoff_policy::BackoffPolicy, retry_policy::RetryPolicy};
use std::sync::Arc;
use std::time::Duration;

/// Chunk sizes should be multiples of this value, except for the last chunk.
pub(crate) const RESUMABLE_UPLOAD_QUANTUM: usize = 256 * 1024;

const DEFAULT_CHUNK_SIZE: usize = 4 * RESUMABLE_UPLOAD_QUANTUM;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub(crate) struct RequestOptions {
    pub retry_policy: Arc<dyn RetryPolicy>,
    pub backoff_policy: Arc<dyn BackoffPolicy>,
    pub chunk_size: usize,
    pub request_timeout: Duration,
}

impl RequestOptions {
    pub(crate) fn new() -> Self {
        let retry_policy = Arc::new(crate::retry_policy::default());
        let backoff_policy = Arc::new(crate::backoff_policy::default());
        Self {
            retry_policy,
            backoff_policy,
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Rejects chunk sizes the upload loop cannot use.
pub(crate) fn validate_chunk_size(chunk_size: usize) -> crate::Result<usize> {
    if chunk_size == 0 {
        return Err(crate::Error::binding("the chunk size must be greater than zero"));
    }
    if chunk_size % RESUMABLE_UPLOAD_QUANTUM != 0 {
        tracing::warn!(
            "chunk size {chunk_size} is not a multiple of {RESUMABLE_UPLOAD_QUANTUM}, the service may reject the upload"
        );
    }
    Ok(chunk_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn defaults() {
        let options = RequestOptions::new();
        assert_eq!(options.chunk_size, 1024 * 1024);
        assert_eq!(options.request_timeout, Duration::from_secs(30));
    }

    #[test_case(1)]
    #[test_case(4)]
    #[test_case(RESUMABLE_UPLOAD_QUANTUM)]
    #[test_case(RESUMABLE_UPLOAD_QUANTUM + 1)]
    fn valid_chunk_size(input: usize) {
        let got = validate_chunk_size(input);
        assert!(matches!(got, Ok(v) if v == input), "{got:?}");
    }

    #[test]
    fn zero_chunk_size() {
        let got = validate_chunk_size(0);
        assert!(matches!(&got, Err(e) if e.is_binding()), "{got:?}");
    }
}
