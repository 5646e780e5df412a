#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core abstractions for the restwire crates.
//!
//! This crate holds the pieces that are independent of HTTP itself:
//!
//! - **Universal retry strategies** via the [`BackoffStrategy`](retry::BackoffStrategy) trait
//!   - Linear backoff (`attempt × step`)
//!   - Custom retry predicates
//!
//! Everything here is synchronous. Waiting between attempts blocks the calling
//! thread, which matches how the execution engine is driven.
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use restwire_core::prelude::*;
//! use std::time::Duration;
//!
//! let backoff = LinearBackoff::builder()
//!     .max_retries(4)
//!     .step(Duration::from_millis(1))
//!     .build();
//!
//! let result = backoff.execute(|_attempt| Ok::<_, std::io::Error>(42));
//! assert_eq!(result.unwrap(), 42);
//! ```

pub mod retry;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use restwire_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::retry::{BackoffStrategy, LinearBackoff, LinearBackoffBuilder};
}
