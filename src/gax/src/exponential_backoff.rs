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

//! Truncated [exponential backoff] with full jitter.
//!
//! After the n-th failed attempt the policy waits a random time in
//! `[0, min(initial_delay * scaling^(n - 1), maximum_delay)]`. Spreading the
//! delays keeps many uploads that failed together from retrying together.
//!
//! [exponential backoff]: https://en.wikipedia.org/wiki/Exponential_backoff

use crate::backoff_policy::BackoffPolicy;
use crate::retry_state::RetryState;
use std::time::Duration;

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAXIMUM_DELAY: Duration = Duration::from_secs(60);
const DEFAULT_SCALING: f64 = 2.0;

/// Errors building an [ExponentialBackoff].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the scaling factor must be at least 1.0, got {0}")]
    InvalidScalingFactor(f64),
    #[error("the initial delay must be positive, got {0:?}")]
    InvalidInitialDelay(Duration),
    #[error("the maximum delay ({maximum:?}) is shorter than the initial delay ({initial:?})")]
    EmptyRange {
        maximum: Duration,
        initial: Duration,
    },
}

/// Configures an [ExponentialBackoff].
///
/// # Example
/// ```
/// # use drive_upload_gax::exponential_backoff::{Error, ExponentialBackoffBuilder};
/// use std::time::Duration;
///
/// // Wait up to 250ms after the first failed chunk, doubling up to 10s.
/// let backoff = ExponentialBackoffBuilder::new()
///     .with_initial_delay(Duration::from_millis(250))
///     .with_maximum_delay(Duration::from_secs(10))
///     .build()?;
/// # Ok::<(), Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
}

impl ExponentialBackoffBuilder {
    /// Starts from a 1s initial delay, doubling up to 60s.
    pub fn new() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            maximum_delay: DEFAULT_MAXIMUM_DELAY,
            scaling: DEFAULT_SCALING,
        }
    }

    /// Sets the upper bound of the delay after the first failure.
    pub fn with_initial_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.initial_delay = v.into();
        self
    }

    /// Sets the upper bound of any delay.
    pub fn with_maximum_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.maximum_delay = v.into();
        self
    }

    /// Sets how much the delay bound grows after each failure.
    pub fn with_scaling<V: Into<f64>>(mut self, v: V) -> Self {
        self.scaling = v.into();
        self
    }

    /// Validates the parameters and creates the policy.
    ///
    /// # Example
    /// ```
    /// # use drive_upload_gax::exponential_backoff::{Error, ExponentialBackoffBuilder};
    /// # use drive_upload_gax::backoff_policy::BackoffPolicy;
    /// # use drive_upload_gax::retry_state::RetryState;
    /// use std::time::Duration;
    /// let backoff = ExponentialBackoffBuilder::new()
    ///     .with_initial_delay(Duration::from_secs(2))
    ///     .with_maximum_delay(Duration::from_secs(30))
    ///     .with_scaling(3.0)
    ///     .build()?;
    /// let second = backoff.on_failure(&RetryState::new(true).set_attempt_count(2_u32));
    /// assert!(second <= Duration::from_secs(6));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn build(self) -> Result<ExponentialBackoff, Error> {
        let Self {
            initial_delay,
            maximum_delay,
            scaling,
        } = self;
        if scaling < 1.0 {
            return Err(Error::InvalidScalingFactor(scaling));
        }
        if initial_delay.is_zero() {
            return Err(Error::InvalidInitialDelay(initial_delay));
        }
        if maximum_delay < initial_delay {
            return Err(Error::EmptyRange {
                maximum: maximum_delay,
                initial: initial_delay,
            });
        }
        Ok(ExponentialBackoff {
            initial_delay,
            maximum_delay,
            scaling,
        })
    }

    /// Creates the policy, forcing each parameter into a usable range.
    ///
    /// The maximum delay ends up in `[1s, 24h]`, the initial delay in
    /// `[1ms, maximum_delay]`, and the scaling factor in `[1.0, 32.0]`.
    pub fn clamp(self) -> ExponentialBackoff {
        let maximum_delay = self
            .maximum_delay
            .clamp(Duration::from_secs(1), Duration::from_secs(24 * 60 * 60));
        ExponentialBackoff {
            initial_delay: self
                .initial_delay
                .clamp(Duration::from_millis(1), maximum_delay),
            maximum_delay,
            scaling: self.scaling.clamp(1.0, 32.0),
        }
    }
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncated exponential backoff with full jitter.
#[derive(Debug)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
}

impl ExponentialBackoff {
    /// The delay bound after `attempt_count` failures.
    fn ceiling(&self, attempt_count: u32) -> Duration {
        let exponent = i32::try_from(attempt_count.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.scaling.powi(exponent);
        // `mul_f64` panics on overflow, compare the ratios instead.
        if factor >= self.maximum_delay.div_duration_f64(self.initial_delay) {
            return self.maximum_delay;
        }
        self.initial_delay.mul_f64(factor)
    }

    fn jittered(&self, attempt_count: u32, rng: &mut impl rand::Rng) -> Duration {
        rng.random_range(Duration::ZERO..=self.ceiling(attempt_count))
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            maximum_delay: DEFAULT_MAXIMUM_DELAY,
            scaling: DEFAULT_SCALING,
        }
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn on_failure(&self, state: &RetryState) -> Duration {
        self.jittered(state.attempt_count, &mut rand::rng())
    }
}
