//! Error types for restwire
//!
//! Every failure surfaced by the request layer is an [`Error`]. Transport
//! faults keep their [`TransportError`] as the source so callers can inspect
//! what went wrong on the wire after retries were exhausted.

use restwire_transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for restwire operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for restwire.
#[derive(Debug, Error)]
pub enum Error {
    /// The exchange could not complete after all attempts.
    #[error("Transport failure after {attempts} attempt(s): {source}")]
    Transport {
        /// Number of attempts made, including the first
        attempts: u32,
        /// Last transport fault observed
        #[source]
        source: TransportError,
    },

    /// The server answered with an error status that no transform recovered.
    #[error("Request failed with status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body as text
        body: String,
    },

    /// The server broke the pagination contract.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The request was configured inconsistently.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A URI could not be composed.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Invalid HTTP header name.
    #[error("Invalid HTTP header name: {0}")]
    InvalidHeaderName(String),

    /// Invalid HTTP header value.
    #[error("Invalid HTTP header value: {0}")]
    InvalidHeaderValue(String),

    /// The authentication generator failed to produce headers.
    #[error("Authentication failed: {0}")]
    Authentication(#[source] anyhow::Error),

    /// The credential lock could not be obtained in time.
    #[error("Timed out after {waited:?} waiting for the lock of credential '{credential}'")]
    LockTimeout {
        /// Credential identifier whose lock was contended
        credential: String,
        /// How long the caller waited
        waited: Duration,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client configuration or initialization error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl Error {
    /// Check if this error is worth another attempt.
    ///
    /// Only transport faults qualify; an error status means the server
    /// answered and the answer will not change by asking again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// Status code of a [`Error::Status`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Wrap a single transport fault observed on the given attempt count.
    pub(crate) fn transport(attempts: u32, source: TransportError) -> Self {
        Error::Transport { attempts, source }
    }
}
