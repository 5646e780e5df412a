//! Linear backoff.

use super::strategy::BackoffStrategy;
use std::time::Duration;

/// Linear backoff strategy.
///
/// The wait after failed attempt `n` (0-indexed) is `n × step`, optionally
/// capped at `max_delay`. The first retry therefore happens immediately.
///
/// # Formula
///
/// ```text
/// delay(n) = min(step * n, max_delay)
/// ```
///
/// # Examples
///
/// ```rust
/// use restwire_core::retry::{BackoffStrategy, LinearBackoff};
/// use std::time::Duration;
///
/// let backoff = LinearBackoff::builder()
///     .max_retries(4)
///     .step(Duration::from_secs(1))
///     .build();
///
/// assert_eq!(backoff.next_delay(0), Some(Duration::ZERO));
/// assert_eq!(backoff.next_delay(3), Some(Duration::from_secs(3)));
/// ```
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    max_retries: u32,
    step: Duration,
    max_delay: Option<Duration>,
}

impl LinearBackoff {
    /// Create a new builder for configuring linear backoff.
    pub fn builder() -> LinearBackoffBuilder {
        LinearBackoffBuilder::default()
    }

    /// The per-attempt step.
    pub fn step(&self) -> Duration {
        self.step
    }
}

impl Default for LinearBackoff {
    /// Defaults:
    /// - `max_retries`: 4 (five attempts in total)
    /// - `step`: 1s
    /// - `max_delay`: none
    fn default() -> Self {
        Self {
            max_retries: 4,
            step: Duration::from_secs(1),
            max_delay: None,
        }
    }
}

impl BackoffStrategy for LinearBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        let delay = self.step.saturating_mul(attempt);
        Some(match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        })
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Builder for configuring [`LinearBackoff`].
#[derive(Debug, Default)]
pub struct LinearBackoffBuilder {
    max_retries: Option<u32>,
    step: Option<Duration>,
    max_delay: Option<Duration>,
}

impl LinearBackoffBuilder {
    /// Set the maximum number of retries after the first attempt.
    ///
    /// Default: 4
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the amount the delay grows by on every attempt.
    ///
    /// Default: 1s
    pub fn step(mut self, step: Duration) -> Self {
        self.step = Some(step);
        self
    }

    /// Cap the delay between attempts.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Build the final `LinearBackoff`.
    pub fn build(self) -> LinearBackoff {
        let defaults = LinearBackoff::default();
        LinearBackoff {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            step: self.step.unwrap_or(defaults.step),
            max_delay: self.max_delay.or(defaults.max_delay),
        }
    }
}
