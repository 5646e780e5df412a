//! HTTP response wrapper

use super::pagination;
use crate::error::Result;
use http::header::{ETAG, HeaderMap, HeaderValue, LINK};
use http::StatusCode;
use restwire_transport::HttpResponse;
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// A complete response as seen by callers and error transforms.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    url: Url,
    from_cache: bool,
}

impl Response {
    /// Create a new response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<String>, url: Url) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            url,
            from_cache: false,
        }
    }

    /// Wrap a transport response received for `url`. Invalid UTF-8 is replaced.
    pub(crate) fn from_transport(raw: HttpResponse, url: Url) -> Self {
        let body = match String::from_utf8(raw.body) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Self::new(raw.status, raw.headers, body, url)
    }

    /// The cached response, with headers overlaid by those of a 304 revalidation.
    ///
    /// Status and body stay those of the cached response. Every header name
    /// present on the 304 replaces the cached values for that name.
    pub(crate) fn revalidated(&self, fresh: &HeaderMap) -> Self {
        let mut headers = self.headers.clone();
        for name in fresh.keys() {
            headers.remove(name);
            for value in fresh.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        Self {
            status: self.status,
            headers,
            body: self.body.clone(),
            url: self.url.clone(),
            from_cache: true,
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the status code as a number.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Check if the response indicates an error (status ≥ 400).
    pub fn is_error(&self) -> bool {
        self.status.as_u16() >= 400
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value as string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the response body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Consume the response and return its body.
    pub fn into_body(self) -> String {
        self.body
    }

    /// URL the response was received for.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the body was served from the conditional cache after a 304.
    pub fn is_from_cache(&self) -> bool {
        self.from_cache
    }

    pub(crate) fn etag(&self) -> Option<&HeaderValue> {
        self.headers.get(ETAG)
    }

    /// All `Link` header values joined with `, `, if any are present.
    pub fn link_header(&self) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        (!values.is_empty()).then(|| values.join(", "))
    }

    /// Relation name to target for every entry of the `Link` headers.
    pub fn links(&self) -> HashMap<String, String> {
        self.link_header()
            .map(|header| pagination::parse_link_header(&header))
            .unwrap_or_default()
    }

    /// Parse the body as JSON. An empty body is [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) if the body is not JSON.
    pub fn json(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}
