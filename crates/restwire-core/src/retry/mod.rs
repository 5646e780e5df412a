//! Retry strategies and backoff implementations.
//!
//! # Key Types
//!
//! - [`BackoffStrategy`] - Core trait for retry strategies
//! - [`LinearBackoff`] - Delay grows by a fixed step per attempt
//!
//! # Examples
//!
//! ```rust
//! use restwire_core::retry::{BackoffStrategy, LinearBackoff};
//! use std::time::Duration;
//!
//! let backoff = LinearBackoff::builder()
//!     .max_retries(2)
//!     .step(Duration::from_millis(1))
//!     .build();
//!
//! let result = backoff.execute(|attempt| {
//!     if attempt < 2 {
//!         Err(std::io::Error::other("flaky"))
//!     } else {
//!         Ok(attempt)
//!     }
//! });
//! assert_eq!(result.unwrap(), 2);
//! ```

mod linear;
mod strategy;

pub use linear::{LinearBackoff, LinearBackoffBuilder};
pub use strategy::BackoffStrategy;
