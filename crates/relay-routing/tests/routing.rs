//! Routing against real HTTP backends simulated with wiremock.

use std::sync::Arc;
use std::time::Duration;

use relay_core::{BackendConfig, MemoryRule, ModelConfig, RelayConfig, SelectionReason, Timeouts};
use relay_routing::BackendSelector;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GB: u64 = 1 << 30;

fn timeouts() -> Timeouts {
    Timeouts {
        probe: Duration::from_secs(2),
        busy_threshold: Duration::from_millis(300),
        model_info: Duration::from_secs(2),
        ..Timeouts::default()
    }
}

fn backend(name: &str, server: &MockServer) -> BackendConfig {
    let addr = server.address();
    BackendConfig::local(name, addr.ip().to_string(), addr.port())
}

/// A backend whose root answers 200 after `delay`.
async fn ollama(delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Ollama is running")
                .set_delay(delay),
        )
        .mount(&server)
        .await;
    server
}

async fn mount_tags(server: &MockServer, models: serde_json::Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn selector(backends: Vec<BackendConfig>, model: ModelConfig) -> BackendSelector {
    let config = RelayConfig::from_backends(backends, model, timeouts()).unwrap();
    BackendSelector::with_http(Arc::new(config)).unwrap()
}

#[tokio::test]
async fn routes_to_priority_one_when_both_healthy() {
    let fast = ollama(Duration::ZERO).await;
    let slow_rank = ollama(Duration::ZERO).await;

    let selector = selector(
        vec![
            backend("legacy", &slow_rank).with_priority(2),
            backend("high_performance", &fast).with_priority(1),
        ],
        ModelConfig::default(),
    );

    let selected = selector.select(Some("llama2")).await.unwrap();
    assert_eq!(selected.name(), "high_performance");
    assert_eq!(selected.reason, SelectionReason::Ranked);
}

#[tokio::test]
async fn busy_backend_is_skipped() {
    let busy = ollama(Duration::from_millis(800)).await;
    let idle = ollama(Duration::ZERO).await;

    let selector = selector(
        vec![
            backend("busy", &busy).with_priority(1),
            backend("idle", &idle).with_priority(2),
        ],
        ModelConfig::default(),
    );

    assert_eq!(selector.select(Some("llama2")).await.unwrap().name(), "idle");
}

#[tokio::test]
async fn unreachable_backends_fall_back_to_first_enabled() {
    let selector = selector(
        vec![
            BackendConfig::local("first", "127.0.0.1", 1).with_priority(2),
            BackendConfig::local("second", "127.0.0.1", 2).with_priority(1),
        ],
        ModelConfig::default(),
    );

    let selected = selector.select(Some("llama2")).await.unwrap();
    assert_eq!(selected.name(), "first");
    assert_eq!(selected.reason, SelectionReason::DegradedFallback);
}

#[tokio::test]
async fn catalog_size_excludes_small_backend() {
    let big = ollama(Duration::ZERO).await;
    let small = ollama(Duration::ZERO).await;
    mount_tags(&small, json!([{ "name": "llama2:13b", "size": 12 * GB }]), 1).await;

    let selector = selector(
        vec![
            backend("small", &small).with_priority(1).with_max_memory_gb(8.0),
            backend("big", &big).with_priority(2),
        ],
        ModelConfig::default(),
    );

    let selected = selector.select(Some("llama2:13b")).await.unwrap();
    assert_eq!(selected.name(), "big");
    assert_eq!(selected.required_memory_gb, Some(12.0));
}

#[tokio::test]
async fn cached_estimate_skips_catalog_query() {
    let server = ollama(Duration::ZERO).await;
    mount_tags(&server, json!([{ "name": "llama2:latest", "size": 4 * GB }]), 1).await;

    let model = ModelConfig {
        cache_enabled: true,
        memory_patterns: vec![MemoryRule::new("llama2", 99.0).unwrap()],
        ..ModelConfig::default()
    };
    let selector = selector(vec![backend("only", &server)], model);

    for _ in 0..3 {
        let selected = selector.select(Some("llama2")).await.unwrap();
        assert_eq!(selected.required_memory_gb, Some(4.0));
    }
    // The mock's expect(1) is verified when `server` drops.
}

#[tokio::test]
async fn expired_cache_entry_is_refreshed() {
    let server = ollama(Duration::ZERO).await;
    mount_tags(&server, json!([{ "name": "llama2", "size": 4 * GB }]), 2).await;

    let model = ModelConfig {
        cache_enabled: true,
        cache_ttl: Duration::ZERO,
        ..ModelConfig::default()
    };
    let selector = selector(vec![backend("only", &server)], model);

    selector.select(Some("llama2")).await.unwrap();
    selector.select(Some("llama2")).await.unwrap();
}
