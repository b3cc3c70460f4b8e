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

use super::Result;
use super::backoff_policy::BackoffPolicy;
use super::error::Error;
use super::retry_policy::RetryPolicy;
use super::retry_result::RetryResult;
use super::retry_state::RetryState;
use std::sync::Arc;
use std::time::Duration;

/// Repeats `inner` until it succeeds or the retry policy gives up.
///
/// `inner` receives the time left in the loop, if the retry policy bounds it.
/// Between attempts the loop waits for the delay chosen by `backoff_policy`,
/// using `sleep` so callers can make the wait cancellable.
pub async fn retry_loop<F, S, Response>(
    inner: F,
    sleep: S,
    idempotent: bool,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
) -> Result<Response>
where
    F: AsyncFnMut(Option<Duration>) -> Result<Response> + Send,
    S: AsyncFn(Duration) -> () + Send,
{
    retry_loop_with_callback(
        inner,
        sleep,
        idempotent,
        retry_policy,
        backoff_policy,
        |_, _, _| {},
    )
    .await
}

/// Like [retry_loop], and reports each retry to `on_retry`.
///
/// `on_retry` runs before the backoff sleep and receives the number of the
/// attempt that failed, its error, and the delay before the next attempt.
///
/// A permanent error is returned as-is. When the policy is exhausted, or the
/// next delay would not fit in the remaining time, the last error is wrapped
/// with [Error::exhausted].
pub async fn retry_loop_with_callback<F, S, OnRetry, Response>(
    mut inner: F,
    sleep: S,
    idempotent: bool,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
    mut on_retry: OnRetry,
) -> Result<Response>
where
    F: AsyncFnMut(Option<Duration>) -> Result<Response> + Send,
    S: AsyncFn(Duration) -> () + Send,
    OnRetry: FnMut(u32, &Error, Duration) + Send,
{
    let mut state = RetryState::new(idempotent);
    loop {
        let remaining = retry_policy.remaining_time(&state);
        state.attempt_count += 1;
        let error = match inner(remaining).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };
        let error = match retry_policy.on_error(&state, error) {
            RetryResult::Continue(e) => e,
            RetryResult::Permanent(e) => return Err(e),
            RetryResult::Exhausted(e) => return Err(Error::exhausted(e)),
        };
        let delay = backoff_policy.on_failure(&state);
        let out_of_time = retry_policy
            .remaining_time(&state)
            .is_some_and(|left| left < delay);
        if out_of_time {
            return Err(Error::exhausted(error));
        }
        on_retry(state.attempt_count, &error, delay);
        sleep(delay).await;
    }
}

/// The timeout for one attempt: the smaller of the per-request timeout and
/// the time left in the retry loop, when either is set.
pub fn effective_timeout(
    attempt_timeout: Option<Duration>,
    remaining_time: Option<Duration>,
) -> Option<Duration> {
    match (attempt_timeout, remaining_time) {
        (Some(a), Some(r)) => Some(a.min(r)),
        (a, r) => a.or(r),
    }
}
