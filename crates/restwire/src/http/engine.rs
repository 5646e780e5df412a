//! Shared execution engine
//!
//! The engine owns every piece of cross-request state: the conditional
//! response cache, one lock per credential, and the mutation throttle. It is
//! constructed once and shared by `Arc` between all clients that should
//! cooperate on those resources.
//!
//! A mutation drops every cached GET whose URL starts with the mutated URL,
//! whatever the credential.

use super::Response;
use super::retry::RetryPolicy;
use crate::auth::Credential;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::observability::{RateLimitSnapshot, RequestMetadata, RequestTimer, ResponseMetadata};
use dashmap::DashMap;
use governor::clock::Clock;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use http::header::{HeaderName, HeaderValue, IF_NONE_MATCH};
use http::{Method, StatusCode};
use parking_lot::{Mutex, MutexGuard};
use restwire_core::retry::BackoffStrategy;
use restwire_transport::http::{HttpTransport, HttpTransportConfig};
use restwire_transport::{HttpRequest, HttpResponse, Transport};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};
use url::Url;

/// Credential identifier used when a client has no credential.
pub const ANONYMOUS_CREDENTIAL: &str = "anonymous";

/// Cache key. Authentication headers are deliberately not part of it; the
/// credential identifier stands in for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RequestIdentity {
    credential: String,
    method: Method,
    url: String,
    body: Option<Vec<u8>>,
}

impl RequestIdentity {
    fn of(credential: &str, request: &HttpRequest) -> Self {
        Self {
            credential: credential.to_string(),
            method: request.method.clone(),
            url: request.url.to_string(),
            body: request.body.clone(),
        }
    }
}

/// Snapshot of the conditional cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of cached responses
    pub entries: usize,
    /// Number of 304 revalidations answered from the cache
    pub hits: u64,
}

/// Performs exchanges on behalf of every client sharing it.
pub struct ExecutionEngine {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    cache: DashMap<RequestIdentity, Response>,
    credential_locks: DashMap<String, Arc<Mutex<()>>>,
    // Queues mutations per credential while they wait for the throttle.
    mutation_slots: DashMap<String, Arc<Mutex<()>>>,
    // One send per `mutation_interval` per credential; `None` when the interval is zero.
    throttle: Option<DefaultKeyedRateLimiter<String>>,
    hits: AtomicU64,
}

impl ExecutionEngine {
    /// Create an engine backed by the blocking HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HttpClient`] if the HTTP client cannot be built.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let transport = HttpTransport::with_config(HttpTransportConfig {
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
            user_agent: Some(config.user_agent.clone()),
            ..Default::default()
        })
        .map_err(|e| Error::HttpClient(e.to_string()))?;

        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create an engine on top of any transport.
    pub fn with_transport(config: EngineConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            retry: RetryPolicy::from_config(&config),
            throttle: Quota::with_period(config.mutation_interval).map(RateLimiter::keyed),
            config,
            transport,
            cache: DashMap::new(),
            credential_locks: DashMap::new(),
            mutation_slots: DashMap::new(),
            hits: AtomicU64::new(0),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current cache size and hit count.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }

    /// Perform one exchange, retrying transport faults.
    ///
    /// GETs go through the conditional cache. Other methods are throttled
    /// per credential and drop cached GETs under their URL. Error statuses are returned
    /// as responses; deciding what they mean is up to the caller.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] once every attempt failed on the wire
    /// - [`Error::Authentication`] if the credential cannot produce headers
    /// - [`Error::LockTimeout`] if the credential stayed busy for too long
    pub fn send(&self, request: &HttpRequest, credential: Option<&Credential>) -> Result<Response> {
        let credential_id = credential.map_or(ANONYMOUS_CREDENTIAL, Credential::id);
        let mut meta = RequestMetadata::new(
            request.method.as_str(),
            request.url.as_str(),
            credential_id,
        );
        if let Some(body) = &request.body {
            meta = meta.with_body_size(body.len());
        }

        let response = self
            .retry
            .execute(|attempt| self.attempt(request, credential, &meta, attempt))?;

        if let Some(snapshot) = RateLimitSnapshot::from_headers(response.headers()) {
            snapshot.log();
        }

        Ok(response)
    }

    fn attempt(
        &self,
        request: &HttpRequest,
        credential: Option<&Credential>,
        meta: &RequestMetadata,
        attempt: u32,
    ) -> Result<Response> {
        let mut outgoing = request.clone();
        if let Some(credential) = credential {
            let headers = credential.auth_headers().map_err(Error::Authentication)?;
            for (name, value) in headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| Error::InvalidHeaderName(format!("{name}: {e}")))?;
                let mut value = HeaderValue::from_str(&value)
                    .map_err(|e| Error::InvalidHeaderValue(format!("{name}: {e}")))?;
                value.set_sensitive(true);
                outgoing.headers.insert(name, value);
            }
        }

        if request.method == Method::GET {
            self.exchange_get(request, outgoing, meta, attempt)
        } else {
            self.exchange_mutation(request, outgoing, meta, attempt)
        }
    }

    fn exchange_get(
        &self,
        request: &HttpRequest,
        mut outgoing: HttpRequest,
        meta: &RequestMetadata,
        attempt: u32,
    ) -> Result<Response> {
        let lock = self.credential_lock(&meta.credential);
        let waited = RequestTimer::start();
        let guard = self.acquire(&lock, &meta.credential)?;
        meta.log_lock_wait(waited.elapsed());

        let identity = RequestIdentity::of(&meta.credential, request);
        let cached = self.cache.get(&identity).map(|entry| entry.value().clone());
        if let Some(etag) = cached.as_ref().and_then(Response::etag) {
            outgoing.headers.insert(IF_NONE_MATCH, etag.clone());
        }

        let timer = RequestTimer::start();
        let raw = self.transmit(&outgoing, meta, attempt);
        drop(guard);
        let raw = raw?;

        if raw.status == StatusCode::NOT_MODIFIED
            && let Some(cached) = &cached
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(url = %request.url, credential = %meta.credential, "Using cached response");
            let response = cached.revalidated(&raw.headers);
            ResponseMetadata::new(response.status_code(), response.body().len(), timer.elapsed())
                .with_cached(true)
                .log_completed(meta);
            return Ok(response);
        }

        let response = Response::from_transport(raw, request.url.clone());
        ResponseMetadata::new(response.status_code(), response.body().len(), timer.elapsed())
            .log_completed(meta);
        trace!(url = %request.url, credential = %meta.credential, "Updating response cache");
        self.cache.insert(identity, response.clone());
        Ok(response)
    }

    fn exchange_mutation(
        &self,
        request: &HttpRequest,
        outgoing: HttpRequest,
        meta: &RequestMetadata,
        attempt: u32,
    ) -> Result<Response> {
        let slot = self.mutation_slot(&meta.credential);
        let waited = RequestTimer::start();
        let queued = self.acquire(&slot, &meta.credential)?;

        let lock = self.credential_lock(&meta.credential);
        let guard = self.throttled(&lock, &meta.credential)?;
        meta.log_lock_wait(waited.elapsed());

        let timer = RequestTimer::start();
        let raw = self.transmit(&outgoing, meta, attempt);
        self.invalidate(&request.url);
        drop(guard);
        drop(queued);

        let response = Response::from_transport(raw?, request.url.clone());
        ResponseMetadata::new(response.status_code(), response.body().len(), timer.elapsed())
            .log_completed(meta);
        Ok(response)
    }

    /// Take the credential lock once the throttle admits a send.
    ///
    /// The throttle cell is consumed while the lock is held, right before
    /// the send. Waiting happens with the lock released so GETs can proceed.
    fn throttled<'a>(&self, lock: &'a Mutex<()>, credential: &str) -> Result<MutexGuard<'a, ()>> {
        let key = credential.to_string();
        loop {
            let guard = self.acquire(lock, credential)?;
            let Some(throttle) = &self.throttle else {
                return Ok(guard);
            };
            match throttle.check_key(&key) {
                Ok(()) => return Ok(guard),
                Err(not_until) => {
                    drop(guard);
                    let delay = not_until.wait_time_from(throttle.clock().now());
                    debug!(credential, delay_ms = delay.as_millis(), "Throttling mutation");
                    std::thread::sleep(delay);
                }
            }
        }
    }

    fn invalidate(&self, mutated: &Url) {
        let prefix = mutated.as_str();
        let before = self.cache.len();
        self.cache.retain(|identity, _| !identity.url.starts_with(prefix));
        let dropped = before.saturating_sub(self.cache.len());
        if dropped > 0 {
            trace!(url = %mutated, dropped, "Invalidated cached responses");
        }
    }

    fn transmit(
        &self,
        outgoing: &HttpRequest,
        meta: &RequestMetadata,
        attempt: u32,
    ) -> Result<HttpResponse> {
        meta.log_request(attempt);
        self.transport.send(outgoing).map_err(|source| {
            debug!(
                transport = self.transport.name(),
                request = %outgoing,
                attempt,
                error = %source,
                "Transport failure"
            );
            Error::transport(attempt + 1, source)
        })
    }

    fn credential_lock(&self, credential: &str) -> Arc<Mutex<()>> {
        self.credential_locks
            .entry(credential.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    fn mutation_slot(&self, credential: &str) -> Arc<Mutex<()>> {
        self.mutation_slots
            .entry(credential.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    fn acquire<'a, T>(&self, lock: &'a Mutex<T>, credential: &str) -> Result<MutexGuard<'a, T>> {
        lock.try_lock_for(self.config.lock_timeout)
            .ok_or_else(|| Error::LockTimeout {
                credential: credential.to_string(),
                waited: self.config.lock_timeout,
            })
    }
}

impl fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("cache", &self.cache_stats())
            .finish_non_exhaustive()
    }
}
