//! HTTP transport client implementation
//!
//! Implements the [`Transport`] trait on top of `reqwest::blocking`. One
//! call to [`Transport::send`] is one exchange; retries are the caller's
//! business.

use crate::error::{Result, TransportError};
use crate::traits::{HttpRequest, HttpResponse, Transport};
use reqwest::blocking::Client as ReqwestClient;
use std::time::{Duration, Instant};
use tracing::trace;

/// HTTP transport implementation
///
/// Handles HTTP requests with:
/// - Connection pooling
/// - Connect and overall exchange timeouts
/// - Full-body buffering, so a truncated body surfaces as an error
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a new HTTP transport with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpTransportConfig::default())
    }

    /// Create a new HTTP transport with custom configuration
    pub fn with_config(config: HttpTransportConfig) -> Result<Self> {
        let mut builder = ReqwestClient::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host);

        if let Some(agent) = config.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    /// The overall exchange timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let started = Instant::now();
        let mut req = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let response = req
            .send()
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?
            .to_vec();

        trace!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "exchange completed"
        );

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest-blocking"
    }
}

/// HTTP transport configuration
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Overall exchange timeout
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// `User-Agent` header value
    pub user_agent: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            user_agent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::http::{Method, StatusCode};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_default_config_timeouts() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_http_transport_with_config() {
        let config = HttpTransportConfig {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
            pool_max_idle_per_host: 2,
            user_agent: Some("restwire-test".into()),
        };

        let transport = HttpTransport::with_config(config).expect("Failed to create transport");
        assert_eq!(transport.timeout(), Duration::from_secs(5));
        assert_eq!(transport.name(), "reqwest-blocking");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_send_returns_error_status_as_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/items"))
            .and(header("x-trace", "1"))
            .and(body_string("payload"))
            .respond_with(ResponseTemplate::new(422).set_body_string("rejected"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url: url::Url = format!("{}/items", mock_server.uri()).parse().unwrap();
        let response = tokio::task::spawn_blocking(move || {
            let transport = HttpTransport::new().unwrap();
            let request = HttpRequest::new(Method::POST, url)
                .with_header(
                    ::http::HeaderName::from_static("x-trace"),
                    ::http::HeaderValue::from_static("1"),
                )
                .with_text_body("payload");
            transport.send(&request)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.text(), "rejected");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connection_refused_is_transport_error() {
        // Bind and drop a server so the port is very likely closed.
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        let result = tokio::task::spawn_blocking(move || {
            let transport = HttpTransport::with_config(HttpTransportConfig {
                connect_timeout: Duration::from_millis(500),
                timeout: Duration::from_secs(2),
                ..Default::default()
            })
            .unwrap();
            transport.send(&HttpRequest::new(Method::GET, uri.parse().unwrap()))
        })
        .await
        .unwrap();

        assert!(matches!(
            result,
            Err(TransportError::Connection(_)) | Err(TransportError::Timeout(_))
                | Err(TransportError::Http(_))
        ));
    }
}
