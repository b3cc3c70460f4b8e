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

//! Retry loop control types.
//!
//! Applications only need this type when implementing their own retry
//! policies.

use crate::error::Error;

/// What the retry loop should do after a failed attempt.
///
/// # Example
///
/// ```
/// # use drive_upload_gax::error::Error;
/// # use drive_upload_gax::retry_policy::RetryPolicy;
/// # use drive_upload_gax::retry_result::RetryResult;
/// # use drive_upload_gax::retry_state::RetryState;
/// /// Retries dropped connections at most twice, nothing else.
/// #[derive(Debug)]
/// struct ConnectionResets;
/// impl RetryPolicy for ConnectionResets {
///     fn on_error(&self, state: &RetryState, error: Error) -> RetryResult {
///         match (error.is_io(), state.attempt_count) {
///             (false, _) => RetryResult::Permanent(error),
///             (true, n) if n >= 3 => RetryResult::Exhausted(error),
///             (true, _) => RetryResult::Continue(error),
///         }
///     }
/// }
/// ```
#[derive(Debug)]
pub enum RetryResult {
    /// Stop the loop and return the error unchanged.
    Permanent(Error),

    /// Stop the loop, the error was retryable but the policy ran out of
    /// attempts or time.
    Exhausted(Error),

    /// Back off and try again.
    Continue(Error),
}

impl RetryResult {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// Consumes the result, returning the error it holds.
    pub fn into_error(self) -> Error {
        match self {
            Self::Permanent(e) | Self::Exhausted(e) | Self::Continue(e) => e,
        }
    }
}
