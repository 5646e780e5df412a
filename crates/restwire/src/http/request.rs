//! Request specification builder

use super::pagination::{self, PageFetch};
use super::Response;
use crate::client::RestClient;
use crate::error::{Error, Result};
use crate::observability::{RequestMetadata, ResponseMetadata};
use crate::uri::UriBuilder;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use restwire_transport::HttpRequest;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

type ErrorTransform<'a> = Box<dyn Fn(&Response) -> Option<Value> + 'a>;

/// A single-use request, created by the verb methods of [`RestClient`].
///
/// Configure it fluently, then consume it with [`execute`](Self::execute)
/// or [`execute_unparsed`](Self::execute_unparsed).
///
/// # Examples
///
/// ```rust,no_run
/// use restwire::{ExecutionEngine, EngineConfig, RestClient};
/// use std::sync::Arc;
///
/// let engine = Arc::new(ExecutionEngine::new(EngineConfig::default())?);
/// let client = RestClient::new(engine, "https://api.example.com")?;
///
/// let issues = client
///     .get("/repos/o/r/issues")
///     .param("state", "open")
///     .max_pages(3)
///     .execute()?;
/// # Ok::<(), restwire::Error>(())
/// ```
#[must_use = "a request does nothing until it is executed"]
pub struct RequestSpec<'a> {
    client: &'a RestClient,
    method: Method,
    endpoint: String,
    params: Vec<(String, String)>,
    body_fields: Vec<(String, Value)>,
    body_json: Option<Value>,
    body_raw: Option<String>,
    headers: Vec<(String, String)>,
    max_pages: usize,
    on_error: Option<ErrorTransform<'a>>,
}

impl<'a> RequestSpec<'a> {
    pub(crate) fn new(client: &'a RestClient, method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            method,
            endpoint: endpoint.into(),
            params: Vec::new(),
            body_fields: Vec::new(),
            body_json: None,
            body_raw: None,
            headers: Vec::new(),
            max_pages: usize::MAX,
            on_error: None,
        }
    }

    /// Add a query parameter. Repeating a key adds another pair.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a field to the JSON object body.
    pub fn body(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body_fields.push((key.into(), value.into()));
        self
    }

    /// Set the whole body as a JSON value.
    ///
    /// Fields added with [`body`](Self::body) are merged into it, which
    /// requires it to be an object.
    pub fn body_json(mut self, value: Value) -> Self {
        self.body_json = Some(value);
        self
    }

    /// Set the body as opaque text. Cannot be combined with the JSON forms.
    pub fn body_raw(mut self, text: impl Into<String>) -> Self {
        self.body_raw = Some(text.into());
        self
    }

    /// Follow at most `count` pages. 0 and 1 disable pagination.
    pub fn max_pages(mut self, count: usize) -> Self {
        self.max_pages = count;
        self
    }

    /// Recover from error statuses.
    ///
    /// The transform sees every response with status ≥ 400. Returning
    /// `Some` makes that value the result; `None` keeps the failure.
    pub fn on_error<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Response) -> Option<Value> + 'a,
    {
        self.on_error = Some(Box::new(transform));
        self
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Execute and parse the result as JSON, following pagination links.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for conflicting body forms, before any network call
    /// - [`Error::Status`] for an error status the transform did not recover
    /// - [`Error::Protocol`] if pagination breaks down
    /// - [`Error::Serialization`] if a body is not JSON
    /// - any engine failure (transport, authentication, lock timeout)
    pub fn execute(self) -> Result<Value> {
        let request = self.prepare()?;
        let engine = self.client.engine();
        let credential = self.client.credential();

        let first = engine.send(&request, credential)?;
        if first.is_error() {
            return self.recover(&request, first);
        }

        pagination::assemble(first, self.max_pages, |next| {
            let url = request
                .url
                .join(next)
                .map_err(|e| Error::InvalidUri(format!("{next}: {e}")))?;
            let continuation = HttpRequest::new(Method::GET, url);
            let page = engine.send(&continuation, credential)?;
            if page.is_error() {
                return self.recover(&continuation, page).map(PageFetch::Replaced);
            }
            Ok(PageFetch::Page(page))
        })
    }

    /// Execute exactly one exchange and return the body text unparsed.
    ///
    /// The error transform is not consulted.
    ///
    /// # Errors
    ///
    /// [`Error::Status`] for any status ≥ 400, plus the failures of
    /// [`execute`](Self::execute) that happen before parsing.
    pub fn execute_unparsed(self) -> Result<String> {
        let request = self.prepare()?;
        let response = self
            .client
            .engine()
            .send(&request, self.client.credential())?;

        if response.is_error() {
            self.log_failure(&request, &response);
            return Err(Error::Status {
                status: response.status_code(),
                body: response.into_body(),
            });
        }
        Ok(response.into_body())
    }

    fn recover(&self, request: &HttpRequest, response: Response) -> Result<Value> {
        if let Some(transform) = &self.on_error
            && let Some(value) = transform(&response)
        {
            return Ok(value);
        }

        self.log_failure(request, &response);
        Err(Error::Status {
            status: response.status_code(),
            body: response.into_body(),
        })
    }

    fn log_failure(&self, request: &HttpRequest, response: &Response) {
        let meta = RequestMetadata::new(
            request.method.as_str(),
            request.url.as_str(),
            self.client.credential_id(),
        );
        ResponseMetadata::new(response.status_code(), response.body().len(), Duration::ZERO)
            .log_failure(&meta, &request.body_text(), response.body());
    }

    /// Resolve URI, headers and body into a wire request.
    fn prepare(&self) -> Result<HttpRequest> {
        let body = self.composed_body()?;

        let mut uri = UriBuilder::from_url(self.client.base())?;
        if !self.endpoint.is_empty() {
            if !uri.path().ends_with('/') && !self.endpoint.starts_with('/') {
                uri = uri.append_path("/");
            }
            uri = uri.append_path(&self.endpoint);
        }
        if !self.params.is_empty() {
            uri = uri.set_query(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidHeaderName(format!("{name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidHeaderValue(format!("{name}: {e}")))?;
            headers.insert(name, value);
        }

        Ok(HttpRequest {
            method: self.method.clone(),
            url: uri.build()?,
            headers,
            body,
        })
    }

    fn composed_body(&self) -> Result<Option<Vec<u8>>> {
        if let Some(raw) = &self.body_raw {
            if self.body_json.is_some() || !self.body_fields.is_empty() {
                return Err(Error::InvalidRequest(
                    "cannot mix a raw body with a JSON body".to_string(),
                ));
            }
            return Ok(Some(raw.clone().into_bytes()));
        }

        if self.body_fields.is_empty() {
            return match &self.body_json {
                Some(value) => Ok(Some(serde_json::to_vec(value)?)),
                None if self.method == Method::GET => Ok(None),
                None => Ok(Some(b"{}".to_vec())),
            };
        }

        let mut object = match &self.body_json {
            None => Map::new(),
            Some(Value::Object(object)) => object.clone(),
            Some(_) => {
                return Err(Error::InvalidRequest(
                    "body fields require the JSON body to be an object".to_string(),
                ));
            }
        };
        for (key, value) in &self.body_fields {
            object.insert(key.clone(), value.clone());
        }
        Ok(Some(serde_json::to_vec(&Value::Object(object))?))
    }
}

impl fmt::Debug for RequestSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint)
            .field("params", &self.params)
            .field("max_pages", &self.max_pages)
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}
