//! Authentication header generation
//!
//! The engine asks an [`AuthenticationGenerator`] for fresh headers before
//! every attempt, so generators backed by short-lived tokens can refresh
//! themselves. Headers produced here never take part in cache identity.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;

/// Source of authentication headers for one credential.
///
/// Implemented for any `Fn() -> anyhow::Result<Vec<(String, String)>>`, so a
/// closure is enough for most callers:
///
/// ```
/// use restwire::auth::AuthenticationGenerator;
///
/// let generator = || -> anyhow::Result<Vec<(String, String)>> {
///     Ok(vec![("Private-Token".to_string(), "abc".to_string())])
/// };
/// assert_eq!(generator.auth_headers().unwrap().len(), 1);
/// ```
pub trait AuthenticationGenerator: Send + Sync {
    /// Produce the headers to attach to the next attempt.
    ///
    /// # Errors
    ///
    /// Any error aborts the exchange with
    /// [`Error::Authentication`](crate::Error::Authentication); it is not retried.
    fn auth_headers(&self) -> anyhow::Result<Vec<(String, String)>>;
}

impl<F> AuthenticationGenerator for F
where
    F: Fn() -> anyhow::Result<Vec<(String, String)>> + Send + Sync,
{
    fn auth_headers(&self) -> anyhow::Result<Vec<(String, String)>> {
        self()
    }
}

/// A single header with a secret value that never changes.
#[derive(Clone)]
pub struct StaticHeaderAuth {
    name: String,
    value: SecretString,
}

impl StaticHeaderAuth {
    /// Send `name: value` with every attempt.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: SecretString::new(value.into().into_boxed_str()),
        }
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new("Authorization", format!("Bearer {}", token.into()))
    }

    /// Header name this generator sets.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for StaticHeaderAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticHeaderAuth")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl AuthenticationGenerator for StaticHeaderAuth {
    fn auth_headers(&self) -> anyhow::Result<Vec<(String, String)>> {
        Ok(vec![(
            self.name.clone(),
            self.value.expose_secret().to_string(),
        )])
    }
}

/// A named credential: the identifier used for locking, throttling and cache
/// identity, plus the generator producing its headers.
#[derive(Clone)]
pub struct Credential {
    id: String,
    generator: Arc<dyn AuthenticationGenerator>,
}

impl Credential {
    /// Create a credential from an identifier and a header generator.
    pub fn new(id: impl Into<String>, generator: impl AuthenticationGenerator + 'static) -> Self {
        Self {
            id: id.into(),
            generator: Arc::new(generator),
        }
    }

    /// Identifier shared by every client using this credential.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Headers for the next attempt.
    pub fn auth_headers(&self) -> anyhow::Result<Vec<(String, String)>> {
        self.generator.auth_headers()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("id", &self.id).finish()
    }
}
