//! Backend selection.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use relay_core::{
    AvailabilityProbe, ModelCatalogSource, RelayConfig, RoutingError, SelectedBackend,
    SelectionReason,
};

use crate::catalog::HttpCatalogClient;
use crate::estimator::MemoryEstimator;
use crate::prober::HttpProbe;

/// Chooses the backend for each request.
///
/// Explicit assignments win outright. Otherwise the enabled local backends
/// that fit the model's estimated memory are probed and the lowest priority
/// among the responsive ones is chosen. When none qualify, the first enabled
/// local backend is used so the request is still served.
#[derive(Debug, Clone)]
pub struct BackendSelector {
    config: Arc<RelayConfig>,
    estimator: MemoryEstimator,
    probe: Arc<dyn AvailabilityProbe>,
}

impl BackendSelector {
    pub fn new(
        config: Arc<RelayConfig>,
        catalog: Arc<dyn ModelCatalogSource>,
        probe: Arc<dyn AvailabilityProbe>,
    ) -> Self {
        let estimator = MemoryEstimator::new(config.clone(), catalog);
        Self {
            config,
            estimator,
            probe,
        }
    }

    /// Selector backed by the HTTP catalog client and HTTP probe, using the
    /// configured timeouts.
    pub fn with_http(config: Arc<RelayConfig>) -> reqwest::Result<Self> {
        let timeouts = config.timeouts;
        let catalog = HttpCatalogClient::new(timeouts.model_info)?;
        let probe = HttpProbe::new(timeouts.probe, timeouts.busy_threshold)?;
        Ok(Self::new(config, Arc::new(catalog), Arc::new(probe)))
    }

    pub const fn estimator(&self) -> &MemoryEstimator {
        &self.estimator
    }

    pub async fn select(&self, model_name: Option<&str>) -> Result<SelectedBackend, RoutingError> {
        if let Some(name) = model_name
            && let Some(target) = self.config.resolve_assignment(name)
        {
            if target.enabled {
                info!(model = name, backend = %target.name, "Using explicitly assigned backend");
                return Ok(SelectedBackend {
                    backend: target.clone(),
                    required_memory_gb: None,
                    reason: SelectionReason::ExplicitAssignment,
                });
            }
            warn!(
                model = name,
                backend = %target.name,
                "Assigned backend is disabled, falling back to automatic selection"
            );
        }

        let enabled: Vec<_> = self.config.enabled_local_backends().collect();
        let Some(&first_enabled) = enabled.first() else {
            return Err(RoutingError::NoEnabledBackends);
        };

        let required_gb = self.estimator.estimate(model_name).await;

        let fitting: Vec<_> = enabled
            .into_iter()
            .filter(|b| b.fits_memory(required_gb))
            .collect();
        let availability = join_all(fitting.iter().map(|b| self.probe.is_available(b))).await;

        let chosen = fitting
            .into_iter()
            .zip(availability)
            .filter_map(|(backend, available)| available.then_some(backend))
            .min_by_key(|b| b.effective_priority());

        let model = model_name.unwrap_or("");
        match chosen {
            Some(backend) => {
                info!(
                    model,
                    backend = %backend.name,
                    required_gb,
                    priority = backend.effective_priority(),
                    "Selected backend"
                );
                Ok(SelectedBackend {
                    backend: backend.clone(),
                    required_memory_gb: Some(required_gb),
                    reason: SelectionReason::Ranked,
                })
            }
            None => {
                warn!(
                    model,
                    backend = %first_enabled.name,
                    required_gb,
                    "No backend fits and is available, using first enabled backend"
                );
                Ok(SelectedBackend {
                    backend: first_enabled.clone(),
                    required_memory_gb: Some(required_gb),
                    reason: SelectionReason::DegradedFallback,
                })
            }
        }
    }
}
