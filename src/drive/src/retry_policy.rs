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

//! Defines the retry policies for Drive uploads.
//!
//! The upload client resends a chunk when the request fails with a transport
//! error (e.g. a broken connection), a timeout, or a server error (any 5xx
//! HTTP status code). Chunk requests declare their byte range explicitly,
//! resending the same chunk is always safe.
//!
//! Rate limiting responses (429) and any other client errors are not retried.
//!
//! Each chunk has its own retry budget: the policy restarts after a chunk is
//! confirmed by the service.

use gax::error::Error;
use gax::retry_policy::{RetryPolicy, RetryPolicyExt};
use gax::retry_result::RetryResult;
use gax::retry_state::RetryState;
use std::sync::Arc;
use std::time::Duration;

/// The default retry policy for the Drive client.
///
/// The client retries transient errors, making at most 5 attempts for each
/// chunk.
pub(crate) fn default() -> impl RetryPolicy {
    RetryableErrors.with_attempt_limit(5)
}

/// Retries transport errors, timeouts, and server errors.
///
/// This policy must be decorated to limit the number of retry attempts and/or
/// the duration of the retry loop.
///
/// # Example
/// ```
/// # use drive_upload::retry_policy::RetryableErrors;
/// use gax::retry_policy::RetryPolicyExt;
/// use drive_upload::client::Drive;
/// use std::time::Duration;
/// let builder = Drive::builder().with_retry_policy(
///     RetryableErrors
///         .with_time_limit(Duration::from_secs(300))
///         .with_attempt_limit(10),
/// );
/// ```
#[derive(Clone, Debug)]
pub struct RetryableErrors;

impl RetryPolicy for RetryableErrors {
    fn on_error(&self, _state: &RetryState, error: Error) -> RetryResult {
        if error.is_transient() {
            return RetryResult::Continue(error);
        }
        RetryResult::Permanent(error)
    }
}

/// Decorate the retry policy to stop on any error that is not transient.
///
/// Used internally in the upload loop. Integrity, protocol, and rejected
/// requests cannot be fixed by resending the same chunk, even if the
/// application policy would retry them.
#[derive(Clone, Debug)]
pub(crate) struct TransientOnly<T> {
    inner: T,
}

impl<T> TransientOnly<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl RetryPolicy for TransientOnly<Arc<dyn RetryPolicy + 'static>> {
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult {
        if !error.is_transient() {
            return RetryResult::Permanent(error);
        }
        self.inner.on_error(state, error)
    }

    fn remaining_time(&self, state: &RetryState) -> Option<Duration> {
        self.inner.remaining_time(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gax::retry_policy::AlwaysRetry;
    use http::HeaderMap;
    use test_case::test_case;

    #[test_case(500)]
    #[test_case(502)]
    #[test_case(503)]
    #[test_case(504)]
    fn retryable_http(code: u16) {
        let p = RetryableErrors;
        assert!(
            p.on_error(&RetryState::new(true), http_error(code))
                .is_continue()
        );
    }

    #[test_case(400)]
    #[test_case(401)]
    #[test_case(403)]
    #[test_case(404)]
    #[test_case(408)]
    #[test_case(429)]
    fn not_retryable_http(code: u16) {
        let p = RetryableErrors;
        assert!(
            p.on_error(&RetryState::new(true), rejected(code))
                .is_permanent()
        );
    }

    #[test]
    fn io_and_timeout() {
        let p = RetryableErrors;
        assert!(
            p.on_error(&RetryState::new(true), Error::io("broken pipe"))
                .is_continue()
        );
        assert!(
            p.on_error(&RetryState::new(true), Error::timeout("deadline"))
                .is_continue()
        );
        assert!(p.remaining_time(&RetryState::new(true)).is_none());
    }

    #[test]
    fn client_side() {
        let p = RetryableErrors;
        for e in [
            Error::integrity("offset"),
            Error::protocol("header"),
            Error::source_read("disk"),
            Error::cancelled(),
        ] {
            let got = p.on_error(&RetryState::new(true), e);
            assert!(got.is_permanent(), "{got:?}");
        }
    }

    #[test]
    fn default_policy() {
        let p = default();
        let got = p.on_error(
            &RetryState::new(true).set_attempt_count(4_u32),
            http_error(503),
        );
        assert!(got.is_continue(), "{got:?}");
        let got = p.on_error(
            &RetryState::new(true).set_attempt_count(5_u32),
            http_error(503),
        );
        assert!(got.is_exhausted(), "{got:?}");
    }

    #[test]
    fn transient_only() {
        let inner: Arc<dyn RetryPolicy + 'static> = Arc::new(AlwaysRetry.with_attempt_limit(3));
        let p = TransientOnly::new(inner);

        let got = p.on_error(&RetryState::new(true), http_error(503));
        assert!(got.is_continue(), "{got:?}");
        let got = p.on_error(
            &RetryState::new(true).set_attempt_count(3_u32),
            http_error(503),
        );
        assert!(got.is_exhausted(), "{got:?}");

        let got = p.on_error(&RetryState::new(true), rejected(404));
        assert!(got.is_permanent(), "{got:?}");
        let got = p.on_error(&RetryState::new(true), Error::integrity("offset"));
        assert!(got.is_permanent(), "{got:?}");
        assert!(p.remaining_time(&RetryState::new(true)).is_none());
    }

    fn http_error(code: u16) -> Error {
        Error::http(code, HeaderMap::new(), bytes::Bytes::from_static(b"try-again"))
    }

    fn rejected(code: u16) -> Error {
        Error::rejected(code, HeaderMap::new(), bytes::Bytes::from_static(b"uh-oh"))
    }
}
