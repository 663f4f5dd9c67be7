//! Model name extraction.
//!
//! Inference endpoints name the model in the JSON body (`model`). Model
//! management endpoints name it in the query string or body (`name`, or
//! `model`). Anything else carries no model. Malformed input never fails the
//! request; it just yields no name.

use serde_json::Value;

/// Paths whose JSON body carries the model as `model`.
const BODY_MODEL_PATHS: &[&str] = &[
    "/api/generate",
    "/api/chat",
    "/api/embed",
    "/v1/chat/completions",
    "/v1/completions",
    "/v1/embeddings",
];

/// Paths that address a model by `name` (or `model`).
const NAMED_MODEL_PATHS: &[&str] = &["/api/pull", "/api/push", "/api/show", "/api/delete"];

/// Whether the model name for `path` may come from the request body.
///
/// Only these bodies are buffered; every other body is streamed upstream.
pub fn reads_body(path: &str) -> bool {
    BODY_MODEL_PATHS
        .iter()
        .chain(NAMED_MODEL_PATHS)
        .any(|p| path.contains(p))
}

/// Find the model a request is about.
///
/// Matching is by substring so prefixed mounts (`/ollama/api/chat`) still work.
pub fn extract_model_name(path: &str, query: Option<&str>, body: &[u8]) -> Option<String> {
    if BODY_MODEL_PATHS.iter().any(|p| path.contains(p)) {
        return body_field(body, &["model"]);
    }
    if NAMED_MODEL_PATHS.iter().any(|p| path.contains(p)) {
        return query
            .and_then(|q| query_field(q, &["name", "model"]))
            .or_else(|| body_field(body, &["name", "model"]));
    }
    None
}

fn query_field(query: &str, keys: &[&str]) -> Option<String> {
    let pairs: Vec<_> = url::form_urlencoded::parse(query.as_bytes()).collect();
    keys.iter().find_map(|key| {
        pairs
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.to_string())
    })
}

fn body_field(body: &[u8], keys: &[&str]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let json: Value = serde_json::from_slice(body).ok()?;
    keys.iter().find_map(|key| {
        json.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
