//! Model memory estimation.
//!
//! Resolution order, first hit wins:
//!
//! 1. no model name: the configured default
//! 2. exact memory override
//! 3. cache (when enabled)
//! 4. live catalog of each enabled local backend, in declaration order
//! 5. first matching pattern rule
//! 6. the configured default

use std::sync::Arc;

use tracing::{debug, warn};

use relay_core::{CatalogEntry, ModelCatalogSource, RelayConfig};

use crate::memory_cache::MemoryCache;

/// Resolves a model name to the memory (GB) it needs. Never fails.
#[derive(Debug, Clone)]
pub struct MemoryEstimator {
    config: Arc<RelayConfig>,
    catalog: Arc<dyn ModelCatalogSource>,
    cache: Option<Arc<MemoryCache>>,
}

impl MemoryEstimator {
    /// Build an estimator. A cache is created when the config enables one.
    pub fn new(config: Arc<RelayConfig>, catalog: Arc<dyn ModelCatalogSource>) -> Self {
        let cache = config
            .model
            .cache_enabled
            .then(|| Arc::new(MemoryCache::new(config.model.cache_ttl)));
        Self {
            config,
            catalog,
            cache,
        }
    }

    /// The cache backing step 3, if caching is enabled.
    pub fn cache(&self) -> Option<&Arc<MemoryCache>> {
        self.cache.as_ref()
    }

    pub async fn estimate(&self, model_name: Option<&str>) -> f64 {
        let model = &self.config.model;
        let Some(name) = model_name.filter(|n| !n.is_empty()) else {
            return model.default_memory_gb;
        };

        if let Some(&gb) = model.memory_overrides.get(name) {
            debug!(model = name, memory_gb = gb, "Memory from override");
            return gb;
        }

        if let Some(cache) = &self.cache
            && let Some(gb) = cache.get(name)
        {
            debug!(model = name, memory_gb = gb, "Memory from cache");
            return gb;
        }

        if let Some(gb) = self.query_backends(name).await {
            if let Some(cache) = &self.cache {
                cache.insert(name, gb);
            }
            return gb;
        }

        if let Some(gb) = model.pattern_memory(name) {
            debug!(model = name, memory_gb = gb, "Memory from pattern");
            return gb;
        }

        debug!(
            model = name,
            memory_gb = model.default_memory_gb,
            "Memory from default"
        );
        model.default_memory_gb
    }

    /// First backend whose catalog lists the model with a size.
    async fn query_backends(&self, name: &str) -> Option<f64> {
        for backend in self.config.enabled_local_backends() {
            match self.catalog.list_models(backend).await {
                Ok(models) => {
                    if let Some(gb) = find_model(&models, name).and_then(CatalogEntry::size_gb) {
                        debug!(
                            model = name,
                            backend = %backend.name,
                            memory_gb = gb,
                            "Memory from backend catalog"
                        );
                        return Some(gb);
                    }
                }
                Err(e) => {
                    warn!(backend = %backend.name, model = name, error = %e, "Failed to fetch model info");
                }
            }
        }
        None
    }
}

/// Exact name first, then the implicit `:latest` tag.
fn find_model<'a>(models: &'a [CatalogEntry], name: &str) -> Option<&'a CatalogEntry> {
    models.iter().find(|m| m.name == name).or_else(|| {
        if name.contains(':') {
            return None;
        }
        let tagged = format!("{name}:latest");
        models.iter().find(|m| m.name == tagged)
    })
}
