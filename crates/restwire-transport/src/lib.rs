#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Transport layer for restwire.
//!
//! The [`Transport`] trait performs exactly one HTTP exchange and reports
//! failures that happen before a complete response is available. Everything
//! above it (caching, locking, retry, pagination) lives in the `restwire`
//! crate, so a transport can be swapped for a scripted one in tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use restwire_transport::{HttpRequest, Transport};
//! use restwire_transport::http::HttpTransport;
//! use http::Method;
//!
//! let transport = HttpTransport::new()?;
//! let request = HttpRequest::new(Method::GET, "https://api.example.com/items".parse()?);
//! let response = transport.send(&request)?;
//! println!("{}", response.status);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod http;
pub mod traits;

pub use error::{Result, TransportError};
pub use traits::{HttpRequest, HttpResponse, Transport};
