//! Transport trait and wire types
//!
//! Defines the synchronous [`Transport`] trait implemented by the blocking
//! HTTP client and by scripted transports in tests.

use crate::error::Result;
use ::http::header::{HeaderMap, HeaderName, HeaderValue};
use ::http::{Method, StatusCode};
use std::fmt;
use url::Url;

/// HTTP request specification
///
/// Represents one fully resolved request to be sent via the [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,

    /// Absolute request URL
    pub url: Url,

    /// Request headers
    pub headers: HeaderMap,

    /// Request body (optional)
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a new HTTP request without headers or body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Set a header, replacing any previous value for the same name
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the request body from string
    pub fn with_text_body(mut self, text: impl Into<String>) -> Self {
        self.body = Some(text.into().into_bytes());
        self
    }

    /// The body as text, lossily decoded
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// HTTP response
///
/// A complete response as received from the server. Error statuses are
/// still responses; only wire failures are reported as errors.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: StatusCode,

    /// Response headers
    pub headers: HeaderMap,

    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new HTTP response
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get the response body as a string, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// First value of a header, if it is valid visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A mechanism able to perform one HTTP exchange.
///
/// Implementations must not retry on their own; retry policy belongs to
/// the caller. A returned `Ok` means a complete response (any status) was
/// received.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send the request and wait for the full response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`](crate::TransportError) if the connection
    /// fails, the deadline passes, or the body cannot be read completely.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;

    /// Name used in log output.
    fn name(&self) -> &'static str {
        "transport"
    }
}
