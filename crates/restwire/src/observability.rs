//! Structured logging for exchanges and rate-limit telemetry
//!
//! Every exchange performed by the engine is logged through this module.
//! The library never installs a subscriber; enable the `trace` feature and
//! call [`init_tracing`] for a ready-made one.

use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{Level, debug, error, info, warn};

/// HTTP request metadata for structured logging
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Absolute request URL
    pub url: String,
    /// Credential identifier the exchange runs under
    pub credential: String,
    /// Request body size in bytes (optional)
    pub body_size: Option<usize>,
}

impl RequestMetadata {
    /// Create new request metadata
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            credential: credential.into(),
            body_size: None,
        }
    }

    /// Set the request body size
    pub fn with_body_size(mut self, size: usize) -> Self {
        self.body_size = Some(size);
        self
    }

    /// Log how long the caller waited for the credential lock
    pub fn log_lock_wait(&self, waited: Duration) {
        debug!(
            method = %self.method,
            url = %self.url,
            credential = %self.credential,
            waited_ms = waited.as_millis(),
            "Acquired credential lock"
        );
    }

    /// Log request being sent
    pub fn log_request(&self, attempt: u32) {
        debug!(
            method = %self.method,
            url = %self.url,
            credential = %self.credential,
            body_size = self.body_size,
            attempt,
            "Sending HTTP request"
        );
    }
}

/// HTTP response metadata for structured logging
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// HTTP status code
    pub status: u16,
    /// Response body size in bytes
    pub body_size: usize,
    /// Time elapsed for the exchange
    pub elapsed: Duration,
    /// Whether the body came from the conditional cache
    pub cached: bool,
}

impl ResponseMetadata {
    /// Create new response metadata
    pub fn new(status: u16, body_size: usize, elapsed: Duration) -> Self {
        Self {
            status,
            body_size,
            elapsed,
            cached: false,
        }
    }

    /// Mark the response as served from the cache after a 304
    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    /// Log a completed exchange
    pub fn log_completed(&self, request: &RequestMetadata) {
        debug!(
            method = %request.method,
            url = %request.url,
            status = self.status,
            elapsed_ms = self.elapsed.as_millis(),
            body_size = self.body_size,
            cached = self.cached,
            "HTTP request completed"
        );
    }

    /// Log an error status that is about to be returned to the caller,
    /// with both the request body and the response body
    pub fn log_failure(&self, request: &RequestMetadata, request_body: &str, body: &str) {
        warn!(
            method = %request.method,
            url = %request.url,
            status = self.status,
            request_body = %request_body,
            body = %body,
            "HTTP request returned an error status"
        );
    }
}

/// Timer for measuring request duration
#[derive(Debug, Clone, Copy)]
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Rate-limit state reported by the server through `x-ratelimit-*` headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitSnapshot {
    /// Requests allowed in the window
    pub limit: u64,
    /// Requests left in the window
    pub remaining: u64,
    /// When the window resets
    pub reset_at: DateTime<Utc>,
}

impl RateLimitSnapshot {
    /// Read the snapshot from response headers.
    ///
    /// Returns `None` unless `x-ratelimit-limit`, `x-ratelimit-remaining` and
    /// `x-ratelimit-reset` are all present and numeric, and the limit is non-zero.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let number = |name: &str| -> Option<i64> {
            headers.get(name)?.to_str().ok()?.trim().parse().ok()
        };

        let limit = u64::try_from(number("x-ratelimit-limit")?).ok()?;
        let remaining = u64::try_from(number("x-ratelimit-remaining")?).ok()?;
        let reset_at = DateTime::from_timestamp(number("x-ratelimit-reset")?, 0)?;

        (limit > 0).then_some(Self {
            limit,
            remaining,
            reset_at,
        })
    }

    /// Remaining share of the limit, in whole percent (rounded down).
    pub fn remaining_percent(&self) -> u64 {
        self.remaining.saturating_mul(100) / self.limit
    }

    /// Level the snapshot is logged at.
    pub fn level(&self) -> Level {
        match self.remaining_percent() {
            p if p < 10 => Level::ERROR,
            p if p < 20 => Level::WARN,
            p if p < 50 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// Whole minutes until the window resets, relative to `now`.
    pub fn minutes_until_reset(&self, now: DateTime<Utc>) -> i64 {
        (self.reset_at - now).num_minutes()
    }

    /// Log the snapshot at a level proportional to how little is left.
    pub fn log(&self) {
        let percent = self.remaining_percent();
        let resets_in = self.minutes_until_reset(Utc::now());
        macro_rules! emit {
            ($mac:ident) => {
                $mac!(
                    limit = self.limit,
                    remaining = self.remaining,
                    percent,
                    resets_in_minutes = resets_in,
                    "Rate limit: {} Remaining: {} ({}%) Resets in: {} minutes",
                    self.limit,
                    self.remaining,
                    percent,
                    resets_in
                )
            };
        }

        let level = self.level();
        if level == Level::ERROR {
            emit!(error)
        } else if level == Level::WARN {
            emit!(warn)
        } else if level == Level::INFO {
            emit!(info)
        } else {
            emit!(debug)
        }
    }
}

/// Install a global `fmt` subscriber filtered by `RUST_LOG` (default `restwire=info`).
///
/// Does nothing if a subscriber is already installed.
#[cfg(feature = "trace")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("restwire=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
