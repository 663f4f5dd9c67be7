//! Availability probing over HTTP.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use relay_core::{AvailabilityProbe, BackendConfig};

/// Outcome of a single `GET /` against a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// HTTP status, when the backend answered at all.
    pub status: Option<u16>,
    /// Wall-clock time until the response headers arrived (or the failure).
    pub latency: Duration,
    pub error: Option<String>,
}

impl ProbeReport {
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

/// Issue one `GET {base_url}/` with `client` and report what happened.
///
/// Never fails; transport errors are captured in the report.
pub async fn probe_root(client: &Client, backend: &BackendConfig) -> ProbeReport {
    let url = format!("{}/", backend.base_url());
    let started = Instant::now();
    let result = client.get(&url).send().await;
    let latency = started.elapsed();

    match result {
        Ok(response) => ProbeReport {
            status: Some(response.status().as_u16()),
            latency,
            error: None,
        },
        Err(e) => ProbeReport {
            status: None,
            latency,
            error: Some(e.to_string()),
        },
    }
}

/// [`AvailabilityProbe`] that requires a 2xx answer faster than the busy threshold.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    busy_threshold: Duration,
}

impl HttpProbe {
    /// `timeout` bounds each probe; `busy_threshold` is the slowest acceptable
    /// successful answer.
    pub fn new(timeout: Duration, busy_threshold: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            busy_threshold,
        })
    }

    /// Probe a backend without applying the busy threshold.
    pub async fn check(&self, backend: &BackendConfig) -> ProbeReport {
        probe_root(&self.client, backend).await
    }
}

#[async_trait]
impl AvailabilityProbe for HttpProbe {
    async fn is_available(&self, backend: &BackendConfig) -> bool {
        let report = self.check(backend).await;

        if let Some(error) = &report.error {
            warn!(backend = %backend.name, %error, "Availability probe failed");
            return false;
        }
        if !report.is_success() {
            debug!(backend = %backend.name, status = ?report.status, "Backend probe returned non-success");
            return false;
        }
        if report.latency >= self.busy_threshold {
            debug!(
                backend = %backend.name,
                latency_ms = report.latency.as_millis(),
                threshold_ms = self.busy_threshold.as_millis(),
                "Backend is busy"
            );
            return false;
        }
        true
    }
}
