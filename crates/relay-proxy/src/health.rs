//! `/health` and `/up`.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;

use relay_core::{BackendConfig, duration_ms};
use relay_routing::{ProbeReport, probe_root};

use crate::server::ProxyState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    /// In config declaration order.
    pub servers: IndexMap<String, ServerHealth>,
    pub external_hosts: IndexMap<String, ExternalHealth>,
}

#[derive(Debug, Serialize)]
pub struct ServerHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    pub priority: Option<i64>,
    pub max_memory_gb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExternalHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const fn status_label(healthy: bool) -> &'static str {
    if healthy { "healthy" } else { "unhealthy" }
}

/// Elapsed time, only when the backend actually answered.
fn answered_in(report: &ProbeReport) -> Option<f64> {
    report.status.map(|_| duration_ms(report.latency))
}

fn server_health(backend: &BackendConfig, report: ProbeReport) -> ServerHealth {
    ServerHealth {
        status: status_label(report.is_success()),
        response_time_ms: answered_in(&report),
        priority: backend.priority,
        max_memory_gb: backend.max_memory_gb,
        error: report.error,
    }
}

fn external_health(backend: &BackendConfig, report: ProbeReport) -> ExternalHealth {
    // Hosted APIs often answer their root with 4xx; only 5xx counts as down.
    let healthy = report.status.is_some_and(|s| s < 500);
    ExternalHealth {
        status: status_label(healthy),
        response_time_ms: answered_in(&report),
        protocol: backend.protocol.clone(),
        error: report.error,
    }
}

/// Probe every enabled backend and build the report.
pub async fn health_report(state: &ProxyState, now: DateTime<Utc>) -> HealthReport {
    let config = &state.config;
    let client = &state.health_client;

    let locals: Vec<_> = config.enabled_local_backends().collect();
    let externals: Vec<_> = config.external_backends().filter(|b| b.enabled).collect();

    let (local_reports, external_reports) = tokio::join!(
        join_all(locals.iter().map(|b| probe_root(client, b))),
        join_all(externals.iter().map(|b| probe_root(client, b))),
    );

    let servers = locals
        .iter()
        .zip(local_reports)
        .map(|(b, r)| (b.name.clone(), server_health(b, r)))
        .collect();
    let external_hosts = externals
        .iter()
        .zip(external_reports)
        .map(|(b, r)| (b.name.clone(), external_health(b, r)))
        .collect();

    HealthReport {
        status: "ok",
        timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        servers,
        external_hosts,
    }
}

/// Backend health summary. Always 200; failures are reported per backend.
pub async fn health(State(state): State<ProxyState>) -> impl IntoResponse {
    Json(health_report(&state, Utc::now()).await)
}

/// Liveness of the relay process itself.
pub async fn up() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
