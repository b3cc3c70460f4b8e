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

//! Defines traits for retry policies and some common implementations.
//!
//! The upload client automatically resends a chunk when the request fails
//! with a transient error. Chunk uploads state their byte range explicitly, so
//! sending the same chunk more than once is safe.
//!
//! Applications may override the default behavior to retry for longer, or to
//! stop retrying sooner.
//!
//! # Example
//! ```
//! # use drive_upload_gax::retry_policy::*;
//! use std::time::Duration;
//! let policy = AlwaysRetry
//!     .with_time_limit(Duration::from_secs(60))
//!     .with_attempt_limit(10);
//! ```

use crate::error::Error;
use crate::retry_result::RetryResult;
use crate::retry_state::RetryState;
use std::sync::Arc;
use std::time::Duration;

/// Determines how errors are handled in the retry loop.
///
/// Implementations of this trait determine if errors are retryable, and for
/// how long the retry loop may continue.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Query the retry policy after an error.
    ///
    /// # Parameters
    /// * `state` - describes the retry loop, including the number of attempts
    ///   and when the loop started.
    /// * `error` - the last error when attempting the request.
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult;

    /// The remaining time in the retry policy.
    ///
    /// For policies based on time, this returns the remaining time in the
    /// policy. The retry loop uses this value to adjust the next request
    /// timeout. For policies that are not time based this returns `None`.
    fn remaining_time(&self, _state: &RetryState) -> Option<Duration> {
        None
    }
}

/// A helper type to use [RetryPolicy] in client and request options.
#[derive(Clone, Debug)]
pub struct RetryPolicyArg(Arc<dyn RetryPolicy>);

impl<T> std::convert::From<T> for RetryPolicyArg
where
    T: RetryPolicy + 'static,
{
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl std::convert::From<Arc<dyn RetryPolicy>> for RetryPolicyArg {
    fn from(value: Arc<dyn RetryPolicy>) -> Self {
        Self(value)
    }
}

impl From<RetryPolicyArg> for Arc<dyn RetryPolicy> {
    fn from(value: RetryPolicyArg) -> Arc<dyn RetryPolicy> {
        value.0
    }
}

/// Extension trait for [RetryPolicy]
pub trait RetryPolicyExt: RetryPolicy + Sized {
    /// Decorate a [RetryPolicy] to limit the total elapsed time in the retry loop.
    ///
    /// # Parameters
    /// * `maximum_duration` - the maximum time in the retry loop.
    fn with_time_limit(self, maximum_duration: Duration) -> LimitedElapsedTime<Self> {
        LimitedElapsedTime::custom(self, maximum_duration)
    }

    /// Decorate a [RetryPolicy] to limit the number of attempts.
    ///
    /// # Parameters
    /// * `maximum_attempts` - the maximum number of attempts, including the
    ///   first one.
    fn with_attempt_limit(self, maximum_attempts: u32) -> LimitedAttemptCount<Self> {
        LimitedAttemptCount::custom(self, maximum_attempts)
    }
}

impl<T: RetryPolicy> RetryPolicyExt for T {}

/// Retries every transient error.
///
/// Transient errors include I/O errors, timeouts, and server errors (HTTP 5xx
/// status codes). This policy should be decorated to limit the number of
/// attempts or the duration of the retry loop.
///
/// # Example
/// ```
/// # use drive_upload_gax::retry_policy::*;
/// # use drive_upload_gax::retry_state::RetryState;
/// # use drive_upload_gax::error::Error;
/// let policy = TransientErrors;
/// let error = Error::http(503, http::HeaderMap::new(), bytes::Bytes::new());
/// assert!(policy.on_error(&RetryState::new(true), error).is_continue());
/// ```
#[derive(Clone, Debug)]
pub struct TransientErrors;

impl RetryPolicy for TransientErrors {
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult {
        if state.idempotent && error.is_transient() {
            RetryResult::Continue(error)
        } else {
            RetryResult::Permanent(error)
        }
    }
}

/// A retry policy that retries all errors.
///
/// This policy must be decorated to limit the number of retry attempts or the
/// duration of the retry loop. The upload client still stops on errors that
/// cannot be fixed by resending the same chunk, such as an integrity error.
#[derive(Clone, Debug)]
pub struct AlwaysRetry;

impl RetryPolicy for AlwaysRetry {
    fn on_error(&self, _state: &RetryState, error: Error) -> RetryResult {
        RetryResult::Continue(error)
    }
}

/// A retry policy that never retries.
///
/// # Example
/// ```
/// # use drive_upload_gax::retry_policy::*;
/// # use drive_upload_gax::retry_state::RetryState;
/// # use drive_upload_gax::error::Error;
/// let policy = NeverRetry;
/// let error = Error::http(503, http::HeaderMap::new(), bytes::Bytes::new());
/// assert!(policy.on_error(&RetryState::new(true), error).is_exhausted());
/// ```
#[derive(Clone, Debug)]
pub struct NeverRetry;

impl RetryPolicy for NeverRetry {
    fn on_error(&self, _state: &RetryState, error: Error) -> RetryResult {
        RetryResult::Exhausted(error)
    }
}

/// A retry policy decorator that limits the total time in the retry loop.
///
/// This policy decorates an inner policy and limits the duration of retry
/// loops. Once the loop exceeds its duration limit, this policy returns
/// [Exhausted][RetryResult::Exhausted] for any retryable error. Before this
/// deadline is reached, the policy returns the result of `P::on_error()`.
///
/// # Parameters
/// * `P` - the inner retry policy, defaults to [TransientErrors].
#[derive(Debug)]
pub struct LimitedElapsedTime<P = TransientErrors>
where
    P: RetryPolicy,
{
    inner: P,
    maximum_duration: Duration,
}

impl LimitedElapsedTime {
    /// Creates a new instance, retrying transient errors.
    ///
    /// # Example
    /// ```
    /// # use drive_upload_gax::retry_policy::*;
    /// # use drive_upload_gax::retry_state::RetryState;
    /// # use drive_upload_gax::error::Error;
    /// use std::time::{Duration, Instant};
    /// let policy = LimitedElapsedTime::new(Duration::from_secs(10));
    /// let state = RetryState::new(true).set_start(Instant::now() - Duration::from_secs(20));
    /// let error = Error::http(503, http::HeaderMap::new(), bytes::Bytes::new());
    /// assert!(policy.on_error(&state, error).is_exhausted());
    /// ```
    pub fn new(maximum_duration: Duration) -> Self {
        Self::custom(TransientErrors, maximum_duration)
    }
}

impl<P> LimitedElapsedTime<P>
where
    P: RetryPolicy,
{
    /// Creates a new instance with a custom inner policy.
    pub fn custom(inner: P, maximum_duration: Duration) -> Self {
        Self {
            inner,
            maximum_duration,
        }
    }

    fn error_if_exhausted(&self, state: &RetryState, error: Error) -> RetryResult {
        let deadline = state.start + self.maximum_duration;
        let now = std::time::Instant::now();
        if now < deadline {
            RetryResult::Continue(error)
        } else {
            RetryResult::Exhausted(error)
        }
    }
}

impl<P> RetryPolicy for LimitedElapsedTime<P>
where
    P: RetryPolicy,
{
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult {
        match self.inner.on_error(state, error) {
            RetryResult::Permanent(e) => RetryResult::Permanent(e),
            RetryResult::Exhausted(e) => RetryResult::Exhausted(e),
            RetryResult::Continue(e) => self.error_if_exhausted(state, e),
        }
    }

    fn remaining_time(&self, state: &RetryState) -> Option<Duration> {
        let deadline = state.start + self.maximum_duration;
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        if let Some(inner) = self.inner.remaining_time(state) {
            return Some(std::cmp::min(remaining, inner));
        }
        Some(remaining)
    }
}

/// A retry policy decorator that limits the number of attempts.
///
/// This policy decorates an inner policy and limits the total number of
/// attempts. Once the maximum number of attempts is reached, this policy
/// returns [Exhausted][RetryResult::Exhausted] for any retryable error.
/// Before that, the policy returns the result of `P::on_error()`.
///
/// # Parameters
/// * `P` - the inner retry policy, defaults to [TransientErrors].
#[derive(Debug)]
pub struct LimitedAttemptCount<P = TransientErrors>
where
    P: RetryPolicy,
{
    inner: P,
    maximum_attempts: u32,
}

impl LimitedAttemptCount {
    /// Creates a new instance, retrying transient errors.
    ///
    /// # Example
    /// ```
    /// # use drive_upload_gax::retry_policy::*;
    /// # use drive_upload_gax::retry_state::RetryState;
    /// # use drive_upload_gax::error::Error;
    /// let policy = LimitedAttemptCount::new(3);
    /// let error = Error::http(503, http::HeaderMap::new(), bytes::Bytes::new());
    /// let state = RetryState::new(true).set_attempt_count(3_u32);
    /// assert!(policy.on_error(&state, error).is_exhausted());
    /// ```
    pub fn new(maximum_attempts: u32) -> Self {
        Self::custom(TransientErrors, maximum_attempts)
    }
}

impl<P> LimitedAttemptCount<P>
where
    P: RetryPolicy,
{
    /// Creates a new instance with a custom inner policy.
    pub fn custom(inner: P, maximum_attempts: u32) -> Self {
        Self {
            inner,
            maximum_attempts,
        }
    }
}

impl<P> RetryPolicy for LimitedAttemptCount<P>
where
    P: RetryPolicy,
{
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult {
        match self.inner.on_error(state, error) {
            RetryResult::Continue(e) if state.attempt_count >= self.maximum_attempts => {
                RetryResult::Exhausted(e)
            }
            result => result,
        }
    }

    fn remaining_time(&self, state: &RetryState) -> Option<Duration> {
        self.inner.remaining_time(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use test_case::test_case;

    mockall::mock! {
        #[derive(Debug)]
        Policy {}
        impl RetryPolicy for Policy {
            fn on_error(&self, state: &RetryState, error: Error) -> RetryResult;
            fn remaining_time(&self, state: &RetryState) -> Option<Duration>;
        }
    }

    fn transient() -> Error {
        Error::http(503, http::HeaderMap::new(), bytes::Bytes::from_static(b"try-again"))
    }

    fn permanent() -> Error {
        Error::rejected(400, http::HeaderMap::new(), bytes::Bytes::from_static(b"bad"))
    }

    // Verify `RetryPolicyArg` can be converted from the desired types.
    #[test]
    fn retry_policy_arg() {
        let policy = LimitedAttemptCount::new(3);
        let _ = RetryPolicyArg::from(policy);

        let policy: Arc<dyn RetryPolicy> = Arc::new(LimitedAttemptCount::new(3));
        let arg = RetryPolicyArg::from(policy);
        let _: Arc<dyn RetryPolicy> = arg.into();
    }

    #[test_case(transient(), true)]
    #[test_case(Error::io("broken pipe"), true)]
    #[test_case(Error::timeout("deadline"), true)]
    #[test_case(permanent(), false)]
    #[test_case(Error::integrity("offset mismatch"), false)]
    #[test_case(Error::protocol("missing header"), false)]
    fn transient_errors(error: Error, want: bool) {
        let p = TransientErrors;
        let got = p.on_error(&RetryState::new(true), error);
        assert_eq!(got.is_continue(), want, "{got:?}");
        assert!(p.remaining_time(&RetryState::new(true)).is_none());
    }

    #[test]
    fn transient_errors_not_idempotent() {
        let p = TransientErrors;
        let got = p.on_error(&RetryState::new(false), transient());
        assert!(got.is_permanent(), "{got:?}");
    }

    #[test]
    fn always_and_never() {
        let got = AlwaysRetry.on_error(&RetryState::new(false), permanent());
        assert!(got.is_continue(), "{got:?}");
        let got = NeverRetry.on_error(&RetryState::new(true), transient());
        assert!(got.is_exhausted(), "{got:?}");
        assert!(NeverRetry.remaining_time(&RetryState::new(true)).is_none());
    }

    #[test]
    fn limited_attempt_count() {
        let p = LimitedAttemptCount::new(3);
        for count in 1..3_u32 {
            let state = RetryState::new(true).set_attempt_count(count);
            let got = p.on_error(&state, transient());
            assert!(got.is_continue(), "{count} {got:?}");
        }
        let state = RetryState::new(true).set_attempt_count(3_u32);
        let got = p.on_error(&state, transient());
        assert!(got.is_exhausted(), "{got:?}");

        let state = RetryState::new(true).set_attempt_count(1_u32);
        let got = p.on_error(&state, permanent());
        assert!(got.is_permanent(), "{got:?}");
    }

    #[test]
    fn limited_attempt_count_forwards() {
        let mut mock = MockPolicy::new();
        mock.expect_on_error()
            .times(1)
            .returning(|_, e| RetryResult::Permanent(e));
        mock.expect_remaining_time()
            .times(1)
            .returning(|_| Some(Duration::from_secs(42)));
        let p = LimitedAttemptCount::custom(mock, 3);
        let got = p.on_error(&RetryState::new(true), transient());
        assert!(got.is_permanent(), "{got:?}");
        assert_eq!(
            p.remaining_time(&RetryState::new(true)),
            Some(Duration::from_secs(42))
        );
    }

    #[test]
    fn limited_elapsed_time() {
        let p = LimitedElapsedTime::new(Duration::from_secs(60));
        let state = RetryState::new(true);
        let got = p.on_error(&state, transient());
        assert!(got.is_continue(), "{got:?}");

        let state = RetryState::new(true).set_start(Instant::now() - Duration::from_secs(120));
        let got = p.on_error(&state, transient());
        assert!(got.is_exhausted(), "{got:?}");
        assert_eq!(p.remaining_time(&state), Some(Duration::ZERO));

        let got = p.on_error(&RetryState::new(true), permanent());
        assert!(got.is_permanent(), "{got:?}");
    }

    #[test]
    fn limited_elapsed_time_remaining_inner_shorter() {
        let mut mock = MockPolicy::new();
        mock.expect_remaining_time()
            .times(1)
            .returning(|_| Some(Duration::from_secs(5)));
        let p = LimitedElapsedTime::custom(mock, Duration::from_secs(60));
        let remaining = p.remaining_time(&RetryState::new(true));
        assert_eq!(remaining, Some(Duration::from_secs(5)));
    }

    #[test]
    fn limited_elapsed_time_remaining_inner_longer() {
        let mut mock = MockPolicy::new();
        mock.expect_remaining_time()
            .times(1)
            .returning(|_| Some(Duration::from_secs(600)));
        let p = LimitedElapsedTime::custom(mock, Duration::from_secs(60));
        let remaining = p.remaining_time(&RetryState::new(true));
        assert!(
            remaining.is_some_and(|d| d <= Duration::from_secs(60)),
            "{remaining:?}"
        );
    }

    #[test]
    fn composed() {
        let p = TransientErrors
            .with_time_limit(Duration::from_secs(60))
            .with_attempt_limit(2);
        let got = p.on_error(&RetryState::new(true).set_attempt_count(1_u32), transient());
        assert!(got.is_continue(), "{got:?}");
        let got = p.on_error(&RetryState::new(true).set_attempt_count(2_u32), transient());
        assert!(got.is_exhausted(), "{got:?}");
        assert!(p.remaining_time(&RetryState::new(true)).is_some());
    }
}
