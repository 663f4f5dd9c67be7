//! Shared helpers for relay-proxy integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relay_core::RelayConfig;
use relay_proxy::{Forwarder, MemoryAuditSink, ProxyState};

/// How long to wait for the audit consumer to catch up.
pub const AUDIT_WAIT: Duration = Duration::from_secs(2);

/// A port nothing listens on.
pub const DEAD_PORT: u16 = 1;

/// A backend whose root endpoint reports healthy.
pub async fn ollama() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Ollama is running"))
        .mount(&server)
        .await;
    server
}

/// One `servers:` list entry pointing at a mock backend.
pub fn server_entry(name: &str, server: &MockServer, priority: i64) -> String {
    format!(
        "  - {{ name: {name}, host: 127.0.0.1, port: {}, priority: {priority} }}\n",
        server.address().port()
    )
}

/// Relay state for a YAML config, with an in-memory audit sink and no
/// process environment lookups.
pub fn state(yaml: &str) -> (ProxyState, Arc<MemoryAuditSink>) {
    let config = RelayConfig::from_yaml_str(yaml).expect("test config is valid");
    let sink = Arc::new(MemoryAuditSink::new());
    let forwarder = Forwarder::new(config.timeouts.request)
        .expect("client builds")
        .with_env_lookup(|_| None);
    let state = ProxyState::from_config(Arc::new(config), sink.clone())
        .expect("state builds")
        .with_forwarder(forwarder);
    (state, sink)
}

/// Drive one request through the router and collect the response.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    (status, headers, body)
}

pub fn json(body: &Bytes) -> serde_json::Value {
    serde_json::from_slice(body).expect("body is JSON")
}
