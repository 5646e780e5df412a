//! Transport error types

use std::fmt;
use std::time::Duration;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised before a complete response was obtained.
///
/// Every variant describes a fault on the wire; a response carrying an
/// error status is not a `TransportError`.
#[derive(Debug)]
pub enum TransportError {
    /// Could not establish a connection
    Connection(String),

    /// The exchange exceeded its deadline
    Timeout(Duration),

    /// Response body could not be read completely (e.g. truncated)
    Body(String),

    /// I/O error
    Io(std::io::Error),

    /// Any other failure reported by the HTTP client
    Http(String),

    /// The HTTP client itself could not be constructed
    Build(String),
}

impl TransportError {
    /// Classify a reqwest error by the phase that failed.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "Connection error: {}", msg),
            Self::Timeout(after) => write!(f, "Timed out after {:?}", after),
            Self::Body(msg) => write!(f, "Failed to read response body: {}", msg),
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::Http(msg) => write!(f, "HTTP error: {}", msg),
            Self::Build(msg) => write!(f, "Failed to build HTTP client: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
