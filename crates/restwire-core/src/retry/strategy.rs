//! The retry strategy trait shared by every backoff implementation.

use std::error::Error;
use std::time::Duration;

/// A strategy for retrying failed operations with backoff.
///
/// Implementations decide when to retry, how long to wait between attempts,
/// and when to give up. Waiting happens on the calling thread.
///
/// # Examples
///
/// ```rust
/// use restwire_core::retry::{BackoffStrategy, LinearBackoff};
/// use std::time::Duration;
///
/// let backoff = LinearBackoff::builder()
///     .max_retries(3)
///     .step(Duration::from_millis(1))
///     .build();
///
/// let result = backoff.execute(|_attempt| Ok::<_, std::io::Error>(42));
/// assert_eq!(result.unwrap(), 42);
/// ```
pub trait BackoffStrategy: Send + Sync {
    /// Execute an operation with retry logic.
    ///
    /// The operation receives the 0-indexed attempt number and is called
    /// repeatedly until it succeeds, [`should_retry`](Self::should_retry)
    /// rejects the error, or [`max_retries`](Self::max_retries) retries have
    /// been spent. The last error is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use restwire_core::retry::{BackoffStrategy, LinearBackoff};
    /// use std::time::Duration;
    ///
    /// let backoff = LinearBackoff::builder()
    ///     .max_retries(4)
    ///     .step(Duration::ZERO)
    ///     .build();
    ///
    /// let mut calls = 0;
    /// let result: Result<(), std::io::Error> = backoff.execute(|_| {
    ///     calls += 1;
    ///     Err(std::io::Error::other("down"))
    /// });
    /// assert!(result.is_err());
    /// assert_eq!(calls, 5);
    /// ```
    fn execute<F, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnMut(u32) -> Result<T, E>,
        E: Error + 'static,
    {
        let mut attempt = 0;
        loop {
            match operation(attempt) {
                Ok(result) => return Ok(result),
                Err(err) if !self.should_retry(&err, attempt) => return Err(err),
                Err(err) if attempt >= self.max_retries() => return Err(err),
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, error = %_err, "operation failed, retrying");

                    if let Some(delay) = self.next_delay(attempt)
                        && !delay.is_zero()
                    {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Determine if an error is retryable.
    ///
    /// Default implementation returns `true` for all errors. Override this
    /// to restrict retries to specific failures (e.g. transport faults only).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use restwire_core::retry::{BackoffStrategy, LinearBackoff};
    /// use std::error::Error;
    /// use std::time::Duration;
    ///
    /// struct TimeoutsOnly {
    ///     inner: LinearBackoff,
    /// }
    ///
    /// impl BackoffStrategy for TimeoutsOnly {
    ///     fn should_retry(&self, error: &(dyn Error + 'static), _attempt: u32) -> bool {
    ///         error.to_string().contains("timed out")
    ///     }
    ///
    ///     fn next_delay(&self, attempt: u32) -> Option<Duration> {
    ///         self.inner.next_delay(attempt)
    ///     }
    ///
    ///     fn max_retries(&self) -> u32 {
    ///         self.inner.max_retries()
    ///     }
    /// }
    /// ```
    fn should_retry(&self, error: &(dyn Error + 'static), attempt: u32) -> bool {
        let _ = (error, attempt);
        true
    }

    /// Calculate the delay before the next retry attempt.
    ///
    /// Called after attempt `attempt` failed and before sleeping, so
    /// `next_delay(0)` is the wait before the second try. `None` means no
    /// wait.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;

    /// Maximum number of retries after the initial attempt.
    ///
    /// With `max_retries() == 4` the operation runs at most 5 times.
    fn max_retries(&self) -> u32;
}
