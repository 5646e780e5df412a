//! HTTP layer: the shared execution engine, request specifications and
//! result assembly.
//!
//! Requests are described with a [`RequestSpec`], executed by the
//! [`ExecutionEngine`], and multi-page results are merged by [`pagination`].

pub use engine::{ANONYMOUS_CREDENTIAL, CacheStats, ExecutionEngine};
pub use request::RequestSpec;
pub use response::Response;
pub use retry::RetryPolicy;

mod engine;
pub mod pagination;
mod request;
mod response;
mod retry;

// Re-export HTTP types from the http crate for convenience
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
