//! Bearer token authentication in front of the proxy.

mod common;

use axum::{body::Body, http::Request};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{AUDIT_WAIT, ollama, send, server_entry, state};
use relay_proxy::{create_router, digest_token};

const ALICE_TOKEN: &str = "alice-secret-token";
const BOB_TOKEN: &str = "bob-secret-token";

async fn setup() -> (wiremock::MockServer, String) {
    let backend = ollama().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"models":[]}"#))
        .mount(&backend)
        .await;

    let yaml = format!(
        "servers:\n{}auth:\n  enabled: true\n  users:\n    - {{ name: alice, token_sha256: \"{}\" }}\n    - {{ name: bob, token_sha256: \"{}\", active: false }}\n",
        server_entry("only", &backend, 1),
        digest_token(ALICE_TOKEN),
        digest_token(BOB_TOKEN),
    );
    (backend, yaml)
}

fn tags(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::get("/api/tags");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn missing_or_bad_tokens_are_rejected() {
    let (_backend, yaml) = setup().await;
    let (state, sink) = state(&yaml);
    let router = create_router(state);

    for authorization in [
        None,
        Some("Bearer wrong-token"),
        Some("Basic YWxpY2U6cGFzcw=="),
        Some("Bearer "),
        Some(&*format!("Bearer {BOB_TOKEN}")),
    ] {
        let (status, headers, _) = send(router.clone(), tags(authorization)).await;
        assert_eq!(status, 401, "{authorization:?}");
        assert_eq!(headers["www-authenticate"], "Bearer");
    }

    // Rejected requests never reach the router, so nothing is audited.
    let events = sink.wait_for(1, std::time::Duration::from_millis(100)).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn valid_token_is_proxied_and_attributed() {
    let (_backend, yaml) = setup().await;
    let (state, sink) = state(&yaml);

    let authorization = format!("Bearer {ALICE_TOKEN}");
    let (status, _, body) = send(create_router(state), tags(Some(&authorization))).await;

    assert_eq!(status, 200);
    assert_eq!(&body[..], br#"{"models":[]}"#);

    let events = sink.wait_for(1, AUDIT_WAIT).await;
    assert_eq!(events[0].user.as_deref(), Some("alice"));
}

#[tokio::test]
async fn health_endpoints_skip_auth() {
    let (_backend, yaml) = setup().await;
    let (state, _) = state(&yaml);
    let router = create_router(state);

    let (status, _, body) = send(router.clone(), Request::get("/up").body(Body::empty()).unwrap()).await;
    assert_eq!(status, 200);
    assert_eq!(&body[..], b"OK");

    let (status, _, _) = send(router, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, 200);
}
