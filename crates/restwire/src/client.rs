//! REST client bound to one base endpoint

use crate::auth::Credential;
use crate::error::Result;
use crate::http::{ANONYMOUS_CREDENTIAL, ExecutionEngine, RequestSpec};
use crate::uri::UriBuilder;
use http::Method;
use std::sync::Arc;
use url::Url;

/// Entry point for building requests against one API root.
///
/// Clients are cheap to clone. Every client created from the same
/// [`ExecutionEngine`] shares its cache, locks and throttle state.
///
/// # Examples
///
/// ```rust,no_run
/// use restwire::auth::{Credential, StaticHeaderAuth};
/// use restwire::{EngineConfig, ExecutionEngine, RestClient};
/// use std::sync::Arc;
///
/// let engine = Arc::new(ExecutionEngine::new(EngineConfig::default())?);
/// let credential = Credential::new("ci-bot", StaticHeaderAuth::bearer("token"));
/// let client = RestClient::with_credential(engine, "https://api.example.com", credential)?;
///
/// let repo = client.restrict("/repos/owner/name")?;
/// repo.post("/issues").body("title", "Flaky test").execute()?;
/// # Ok::<(), restwire::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct RestClient {
    engine: Arc<ExecutionEngine>,
    base: Url,
    credential: Option<Credential>,
}

impl RestClient {
    /// Create an unauthenticated client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`](crate::Error::InvalidUri) if `base` is not an absolute URI.
    pub fn new(engine: Arc<ExecutionEngine>, base: &str) -> Result<Self> {
        Ok(Self {
            engine,
            base: UriBuilder::base(base)?.build()?,
            credential: None,
        })
    }

    /// Create a client whose requests run under `credential`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`](crate::Error::InvalidUri) if `base` is not an absolute URI.
    pub fn with_credential(
        engine: Arc<ExecutionEngine>,
        base: &str,
        credential: Credential,
    ) -> Result<Self> {
        Ok(Self {
            credential: Some(credential),
            ..Self::new(engine, base)?
        })
    }

    /// Derive a client whose base has `prefix` appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`](crate::Error::InvalidUri) if the result is not a valid URI.
    pub fn restrict(&self, prefix: &str) -> Result<Self> {
        let base = UriBuilder::from_url(&self.base)?.append_path(prefix).build()?;
        Ok(Self {
            engine: Arc::clone(&self.engine),
            base,
            credential: self.credential.clone(),
        })
    }

    /// The base endpoint.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The shared engine.
    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// The credential requests run under, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// The credential identifier, `"anonymous"` without a credential.
    pub fn credential_id(&self) -> &str {
        self.credential
            .as_ref()
            .map_or(ANONYMOUS_CREDENTIAL, Credential::id)
    }

    /// Start a GET request.
    pub fn get(&self, endpoint: impl Into<String>) -> RequestSpec<'_> {
        RequestSpec::new(self, Method::GET, endpoint)
    }

    /// Start a POST request.
    pub fn post(&self, endpoint: impl Into<String>) -> RequestSpec<'_> {
        RequestSpec::new(self, Method::POST, endpoint)
    }

    /// Start a PUT request.
    pub fn put(&self, endpoint: impl Into<String>) -> RequestSpec<'_> {
        RequestSpec::new(self, Method::PUT, endpoint)
    }

    /// Start a PATCH request.
    pub fn patch(&self, endpoint: impl Into<String>) -> RequestSpec<'_> {
        RequestSpec::new(self, Method::PATCH, endpoint)
    }

    /// Start a DELETE request.
    pub fn delete(&self, endpoint: impl Into<String>) -> RequestSpec<'_> {
        RequestSpec::new(self, Method::DELETE, endpoint)
    }
}
