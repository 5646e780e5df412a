//! Retry policy for exchanges

use crate::config::EngineConfig;
use crate::error::Error;
use restwire_core::retry::{BackoffStrategy, LinearBackoff};
use std::time::Duration;

/// Linear backoff that only retries transport faults.
///
/// Error statuses, authentication failures and lock timeouts are returned on
/// the first occurrence.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    backoff: LinearBackoff,
}

impl RetryPolicy {
    /// Build the policy from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            backoff: LinearBackoff::builder()
                .max_retries(config.max_attempts.saturating_sub(1))
                .step(config.retry_backoff_step)
                .build(),
        }
    }

    /// Total number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.backoff.max_retries() + 1
    }
}

impl BackoffStrategy for RetryPolicy {
    fn should_retry(&self, error: &(dyn std::error::Error + 'static), _attempt: u32) -> bool {
        error
            .downcast_ref::<Error>()
            .is_some_and(Error::is_retryable)
    }

    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        self.backoff.next_delay(attempt)
    }

    fn max_retries(&self) -> u32 {
        self.backoff.max_retries()
    }
}
