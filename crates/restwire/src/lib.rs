//! # restwire
//!
//! Synchronous REST client layer for JSON APIs, supporting:
//! - Fluent request specifications (query parameters, JSON or raw bodies, headers)
//! - Conditional GET caching with `ETag` / `If-None-Match`
//! - Per-credential serialization and mutation throttling
//! - Bounded retry with linear backoff on transport failures
//! - `Link`-header pagination with page merging
//! - Rate-limit telemetry from `x-ratelimit-*` headers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restwire::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let engine = Arc::new(ExecutionEngine::new(EngineConfig::default())?);
//!     let client = RestClient::new(engine, "https://api.example.com")?;
//!
//!     let open = client
//!         .get("/repos/owner/name/issues")
//!         .param("state", "open")
//!         .on_error(|response| (response.status_code() == 404).then(|| JsonValue::Null))
//!         .execute()?;
//!
//!     println!("{open}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export commonly used types
pub use auth::{AuthenticationGenerator, Credential, StaticHeaderAuth};
pub use client::RestClient;
pub use config::{EngineConfig, EngineConfigBuilder};
pub use error::{Error, Result};
pub use crate::http::{CacheStats, ExecutionEngine, RequestSpec, Response};
pub use uri::UriBuilder;

// Module declarations
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod uri;

pub use serde_json::Value as JsonValue;

/// Prelude module for common imports
///
/// # Examples
///
/// ```rust
/// use restwire::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AuthenticationGenerator, CacheStats, Credential, EngineConfig, Error, ExecutionEngine,
        JsonValue, RequestSpec, Response, RestClient, Result, StaticHeaderAuth, UriBuilder,
    };
}

/// Crate version, automatically updated from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
