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

//! Helpers shared by the Drive resumable upload client.
//!
//! This crate contains the error type, the retry policies, the backoff
//! policies, and the retry loop used in the implementation of the upload
//! engine. None of these types know anything about the upload protocol.

/// An alias of [std::result::Result] where the error is always [crate::error::Error].
///
/// This is the result type used by all functions issuing requests.
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// The core error types.
pub mod error;

/// Defines the state passed to retry and backoff policies.
pub mod retry_state;

/// The result of a retry policy decision.
pub mod retry_result;

pub mod retry_policy;

/// Defines traits for backoff policies and a common implementation.
pub mod backoff_policy;

pub mod exponential_backoff;

#[doc(hidden)]
pub mod retry_loop_internal;
