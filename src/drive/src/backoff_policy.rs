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

//! Defines the backoff policies for Drive uploads.

use gax::exponential_backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

/// The default backoff policy for the Drive client.
///
/// The client waits between 0 and 1 second after the first failure of a
/// chunk, doubling the maximum delay after each failure, up to 60 seconds.
pub(crate) fn default() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_delay(Duration::from_secs(1))
        .with_maximum_delay(Duration::from_secs(60))
        .with_scaling(2.0)
        .clamp()
}
