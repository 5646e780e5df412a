//! Common test utilities and helpers

#![allow(dead_code)]

use http::{HeaderMap, HeaderValue, Method, StatusCode};
use parking_lot::Mutex;
use restwire::{EngineConfig, ExecutionEngine, RestClient};
use restwire_transport::{HttpRequest, HttpResponse, Transport, TransportError};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Run blocking client code off the async test runtime.
///
/// The blocking HTTP client must be created and dropped on a thread without
/// a runtime, so everything that touches it happens inside `f`.
pub async fn blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking test body panicked")
}

/// Engine settings that keep tests fast.
pub fn fast_config() -> EngineConfig {
    EngineConfig::builder()
        .timeout(Duration::from_millis(500))
        .connect_timeout(Duration::from_millis(500))
        .retry_backoff_step(Duration::from_millis(1))
        .mutation_interval(Duration::ZERO)
        .lock_timeout(Duration::from_secs(10))
        .build()
}

/// A real engine over the blocking HTTP transport.
pub fn http_engine() -> Arc<ExecutionEngine> {
    Arc::new(ExecutionEngine::new(fast_config()).expect("engine"))
}

/// Observations made by [`RestReceiver`].
#[derive(Debug, Default)]
pub struct ReceiverState {
    bodies: Mutex<Vec<String>>,
    used_cache: AtomicBool,
    slow_responses: AtomicUsize,
}

impl ReceiverState {
    /// Request bodies in arrival order.
    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().clone()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.bodies.lock().len()
    }

    /// Whether the last request was answered with 304.
    pub fn used_cache(&self) -> bool {
        self.used_cache.load(Ordering::SeqCst)
    }

    /// Make the next `count` responses slower than the client timeout.
    pub fn set_slow_responses(&self, count: usize) {
        self.slow_responses.store(count, Ordering::SeqCst);
    }
}

/// Serves numbered pages under `/test`, linking them with `Link` headers and
/// answering `If-None-Match` revalidations with 304.
pub struct RestReceiver {
    endpoint: String,
    pages: Vec<String>,
    status: u16,
    state: Arc<ReceiverState>,
}

impl RestReceiver {
    /// Start a server answering every request with `pages` and `status`.
    pub async fn start(pages: &[&str], status: u16) -> (MockServer, String, Arc<ReceiverState>) {
        let server = MockServer::start().await;
        let endpoint = format!("{}/test", server.uri());
        let state = Arc::new(ReceiverState::default());

        let receiver = RestReceiver {
            endpoint: endpoint.clone(),
            pages: pages.iter().map(|p| p.to_string()).collect(),
            status,
            state: Arc::clone(&state),
        };
        Mock::given(wiremock::matchers::path_regex("^/test"))
            .respond_with(receiver)
            .mount(&server)
            .await;

        (server, endpoint, state)
    }

    fn etag(body: &str) -> String {
        let mut hasher = DefaultHasher::new();
        body.hash(&mut hasher);
        format!("\"{:x}\"", hasher.finish())
    }
}

impl Respond for RestReceiver {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.state
            .bodies
            .lock()
            .push(String::from_utf8_lossy(&request.body).into_owned());

        let page = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(1);
        let body = &self.pages[page - 1];

        let mut template = ResponseTemplate::new(self.status);
        if self.pages.len() > 1 {
            let mut links = Vec::new();
            if page < self.pages.len() {
                links.push(format!("<{}?page={}>; rel=\"next\"", self.endpoint, page + 1));
            }
            if page > 1 {
                links.push(format!("<{}?page={}>; rel=\"prev\"", self.endpoint, page - 1));
            }
            template = template.insert_header("Link", links.join(", ").as_str());
        }

        self.state.used_cache.store(false, Ordering::SeqCst);

        let slow = self
            .state
            .slow_responses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if slow {
            return template
                .set_body_string(body.clone())
                .set_delay(Duration::from_secs(2));
        }

        let etag = Self::etag(body);
        if let Some(requested) = request.headers.get("if-none-match")
            && requested.to_str().ok() == Some(etag.as_str())
        {
            self.state.used_cache.store(true, Ordering::SeqCst);
            return ResponseTemplate::new(304).insert_header("ETag", etag.as_str());
        }

        template
            .insert_header("ETag", etag.as_str())
            .set_body_string(body.clone())
    }
}

/// One exchange seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// When the exchange started
    pub started: Instant,
    /// When the exchange finished
    pub finished: Instant,
}

type Responder = dyn Fn(&HttpRequest) -> restwire_transport::Result<HttpResponse> + Send + Sync;

/// In-memory transport answering with a closure after a fixed latency.
pub struct ScriptedTransport {
    latency: Duration,
    responder: Box<Responder>,
    log: Mutex<Vec<Recorded>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

impl ScriptedTransport {
    /// Answer every request with `responder` after `latency`.
    pub fn new<F>(latency: Duration, responder: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> restwire_transport::Result<HttpResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            latency,
            responder: Box::new(responder),
            log: Mutex::new(Vec::new()),
        })
    }

    /// Answer every request with `200 {}` after `latency`.
    pub fn ok(latency: Duration) -> Arc<Self> {
        Self::new(latency, |_| Ok(json_response(StatusCode::OK, "{}")))
    }

    /// Fail every request with a refused connection.
    pub fn refusing() -> Arc<Self> {
        Self::new(Duration::ZERO, |_| {
            Err(TransportError::Connection("connection refused".into()))
        })
    }

    /// Everything sent so far, in completion order.
    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().clone()
    }

    /// Number of exchanges attempted.
    pub fn calls(&self) -> usize {
        self.log.lock().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> restwire_transport::Result<HttpResponse> {
        let started = Instant::now();
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        let result = (self.responder)(request);
        self.log.lock().push(Recorded {
            method: request.method.clone(),
            url: request.url.to_string(),
            headers: request.headers.clone(),
            started,
            finished: Instant::now(),
        });
        result
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A JSON response with the given status.
pub fn json_response(status: StatusCode, body: &str) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    HttpResponse::new(status, headers, body.as_bytes().to_vec())
}

/// A client over a scripted transport.
pub fn scripted_client(
    config: EngineConfig,
    transport: Arc<ScriptedTransport>,
) -> (Arc<ExecutionEngine>, RestClient) {
    let engine = Arc::new(ExecutionEngine::with_transport(config, transport));
    let client = RestClient::new(Arc::clone(&engine), "https://api.example.com").expect("client");
    (engine, client)
}
