//! Request forwarding to the selected backend.
//!
//! Requests are relayed with their method, path, query, body and headers,
//! minus hop-by-hop headers and the caller's own credentials. Responses are
//! streamed back unchanged apart from connection-management headers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, header},
    response::Response,
};
use bytes::Bytes;
use futures_util::TryStreamExt;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error, warn};

use relay_core::BackendConfig;

/// Request headers never forwarded upstream.
const STRIPPED_REQUEST_HEADERS: &[&str] = &[
    // hop-by-hop
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    // recomputed by the client
    "host",
    "content-length",
    // the caller's credential is for the relay, not the backend
    "authorization",
    "version",
];

/// Upstream response headers not relayed to the caller.
const STRIPPED_RESPONSE_HEADERS: &[&str] = &["transfer-encoding", "connection"];

fn should_forward_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    !STRIPPED_REQUEST_HEADERS.contains(&lower.as_str())
}

fn should_relay_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    !STRIPPED_RESPONSE_HEADERS.contains(&lower.as_str())
}

/// Errors raised while relaying a request upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Invalid upstream URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Upstream request to {backend} timed out")]
    Timeout { backend: String },

    #[error("Upstream request to {backend} failed: {reason}")]
    Transport { backend: String, reason: String },
}

/// Inbound request body.
pub enum ProxyBody {
    /// Read in full before forwarding.
    Buffered(Bytes),
    /// Relayed to the backend as it arrives, without a size limit.
    Streaming(Body),
}

impl ProxyBody {
    /// The buffered bytes, empty for a streaming body.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Buffered(bytes) => bytes.as_ref(),
            Self::Streaming(_) => &[],
        }
    }
}

impl From<Bytes> for ProxyBody {
    fn from(bytes: Bytes) -> Self {
        Self::Buffered(bytes)
    }
}

impl fmt::Debug for ProxyBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Streaming(_) => f.write_str("Streaming"),
        }
    }
}

/// One inbound request, owned by the handler for its lifetime.
#[derive(Debug)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: ProxyBody,
}

/// `{protocol}://{host}:{port}{path}` plus `?{query}` when the query is non-empty.
pub fn build_request_url(backend: &BackendConfig, path: &str, query: Option<&str>) -> String {
    let base = backend.base_url();
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{base}{path}?{q}"),
        None => format!("{base}{path}"),
    }
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Sends requests to backends and relays their responses.
#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    env: EnvLookup,
}

impl fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Forwarder").finish_non_exhaustive()
    }
}

impl Forwarder {
    /// `timeout` bounds each upstream call, response body included.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            env: Arc::new(|name| std::env::var(name).ok()),
        })
    }

    /// Replace the process environment as the source of backend API keys.
    #[must_use]
    pub fn with_env_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.env = Arc::new(lookup);
        self
    }

    /// Headers to send upstream for `backend`.
    ///
    /// Inbound headers are copied minus the stripped set; a bearer token is
    /// injected when the backend names an API key variable that is set.
    pub fn outbound_headers(&self, inbound: &HeaderMap, backend: &BackendConfig) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
        for (name, value) in inbound {
            if should_forward_header(name.as_str()) {
                headers.append(name.clone(), value.clone());
            }
        }

        if let Some(var) = &backend.api_key_env {
            match (self.env)(var).filter(|key| !key.is_empty()) {
                Some(key) => match HeaderValue::from_str(&format!("Bearer {key}")) {
                    Ok(mut value) => {
                        value.set_sensitive(true);
                        headers.insert(header::AUTHORIZATION, value);
                    }
                    Err(_) => {
                        warn!(backend = %backend.name, var = %var, "API key contains invalid header characters");
                    }
                },
                None => {
                    warn!(backend = %backend.name, "API key environment variable {var} not set");
                }
            }
        }

        headers
    }

    /// Send `request` to `backend` and stream the response back.
    ///
    /// One attempt only. Dropping the returned response drops the upstream
    /// connection.
    pub async fn forward(
        &self,
        request: ProxyRequest,
        backend: &BackendConfig,
    ) -> Result<Response, ForwardError> {
        let url = build_request_url(backend, &request.path, request.query.as_deref());
        let parsed = url::Url::parse(&url).map_err(|e| ForwardError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let headers = self.outbound_headers(&request.headers, backend);
        debug!(backend = %backend.name, method = %request.method, %url, "Forwarding request");

        let mut builder = self.client.request(request.method, parsed).headers(headers);
        match request.body {
            ProxyBody::Buffered(bytes) if bytes.is_empty() => {}
            ProxyBody::Buffered(bytes) => builder = builder.body(bytes),
            ProxyBody::Streaming(body) => {
                builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
            }
        }

        let upstream = builder.send().await.map_err(|e| {
            error!(backend = %backend.name, error = %e, "Upstream request failed");
            if e.is_timeout() {
                ForwardError::Timeout {
                    backend: backend.name.clone(),
                }
            } else {
                ForwardError::Transport {
                    backend: backend.name.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(relay_response(upstream))
    }
}

fn relay_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = HeaderMap::with_capacity(upstream.headers().len());
    for (name, value) in upstream.headers() {
        if should_relay_header(name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }

    let body = Body::from_stream(upstream.bytes_stream().map_err(std::io::Error::other));
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use wiremock::matchers::{body_string, header as header_is, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> BackendConfig {
        let addr = server.address();
        BackendConfig::local("mock", addr.ip().to_string(), addr.port())
    }

    fn forwarder() -> Forwarder {
        Forwarder::new(Duration::from_secs(5))
            .unwrap()
            .with_env_lookup(|_| None)
    }

    fn request(method: Method, path: &str, query: Option<&str>, body: &'static str) -> ProxyRequest {
        ProxyRequest {
            method,
            path: path.to_string(),
            query: query.map(str::to_string),
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()).into(),
        }
    }

    #[test]
    fn test_build_request_url() {
        let backend = BackendConfig::local("hp", "localhost", 11435);
        assert_eq!(
            build_request_url(&backend, "/api/tags", Some("format=json")),
            "http://localhost:11435/api/tags?format=json"
        );
        assert_eq!(
            build_request_url(&backend, "/api/tags", Some("")),
            "http://localhost:11435/api/tags"
        );
        assert_eq!(
            build_request_url(&backend, "/api/tags", None),
            "http://localhost:11435/api/tags"
        );
    }

    #[test]
    fn test_should_forward_header() {
        assert!(should_forward_header("accept"));
        assert!(should_forward_header("content-type"));
        assert!(should_forward_header("x-request-id"));

        assert!(!should_forward_header("Authorization"));
        assert!(!should_forward_header("host"));
        assert!(!should_forward_header("version"));
        assert!(!should_forward_header("connection"));
        assert!(!should_forward_header("transfer-encoding"));
        assert!(!should_forward_header("content-length"));
    }

    #[test]
    fn test_outbound_headers_strip_caller_credentials() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer caller"));
        inbound.insert(header::HOST, HeaderValue::from_static("relay.local"));
        inbound.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let headers = forwarder().outbound_headers(&inbound, &BackendConfig::local("a", "h", 1));
        assert!(headers.get(header::AUTHORIZATION).is_none());
        assert!(headers.get(header::HOST).is_none());
        assert_eq!(headers[header::ACCEPT], "application/json");
    }

    #[test]
    fn test_api_key_is_injected_from_env() {
        let forwarder = forwarder().with_env_lookup(|name| {
            (name == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        });
        let mut inbound = HeaderMap::new();
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer caller"));

        let backend = BackendConfig::external("openai", "api.openai.com", 443)
            .with_api_key_env("OPENAI_API_KEY");
        let headers = forwarder.outbound_headers(&inbound, &backend);
        assert_eq!(headers[header::AUTHORIZATION], "Bearer sk-test");
    }

    #[test]
    fn test_missing_api_key_sends_no_authorization() {
        let backend = BackendConfig::external("openai", "api.openai.com", 443)
            .with_api_key_env("UNSET_KEY");
        let headers = forwarder().outbound_headers(&HeaderMap::new(), &backend);
        assert!(headers.get(header::AUTHORIZATION).is_none());

        let empty = forwarder().with_env_lookup(|_| Some(String::new()));
        let headers = empty.outbound_headers(&HeaderMap::new(), &backend);
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_forward_relays_status_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(query_param("stream", "false"))
            .and(body_string(r#"{"model":"llama2"}"#))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("x-backend", "mock")
                    .set_body_string("created"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = forwarder()
            .forward(
                request(Method::POST, "/api/generate", Some("stream=false"), r#"{"model":"llama2"}"#),
                &backend_for(&server),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 201);
        assert_eq!(response.headers()["x-backend"], "mock");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"created");
    }

    #[tokio::test]
    async fn test_forward_preserves_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/delete"))
            .and(body_string(r#"{"name":"ghost"}"#))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"error":"model not found"}"#))
            .mount(&server)
            .await;

        let response = forwarder()
            .forward(
                request(Method::DELETE, "/api/delete", None, r#"{"name":"ghost"}"#),
                &backend_for(&server),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 404);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"error":"model not found"}"#);
    }

    #[tokio::test]
    async fn test_forward_sends_injected_key_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header_is("authorization", "Bearer sk-upstream"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let forwarder = forwarder().with_env_lookup(|_| Some("sk-upstream".to_string()));
        let mut req = request(Method::GET, "/v1/models", None, "");
        req.headers
            .insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer caller"));
        let backend = backend_for(&server).with_api_key_env("PAID_KEY");

        let response = forwarder.forward(req, &backend).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_streaming_body_is_relayed_in_full() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/blobs/sha256:abc"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let chunks = (0..8u8).map(|i| Ok::<_, std::io::Error>(Bytes::from(vec![i; 16 * 1024])));
        let mut req = request(Method::POST, "/api/blobs/sha256:abc", None, "");
        req.body = ProxyBody::Streaming(Body::from_stream(futures_util::stream::iter(chunks)));

        let response = forwarder().forward(req, &backend_for(&server)).await.unwrap();
        assert_eq!(response.status(), 201);

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].body.len(), 8 * 16 * 1024);
        assert!(received[0].body[..16 * 1024].iter().all(|&b| b == 0));
        assert!(received[0].body[7 * 16 * 1024..].iter().all(|&b| b == 7));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let backend = BackendConfig::local("gone", "127.0.0.1", 1);
        let err = forwarder()
            .forward(request(Method::GET, "/api/tags", None, ""), &backend)
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let forwarder = Forwarder::new(Duration::from_millis(200)).unwrap();
        let err = forwarder
            .forward(request(Method::GET, "/api/tags", None, ""), &backend_for(&server))
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Timeout { .. }));
    }
}
