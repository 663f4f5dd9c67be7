//! HTTP adapter for the model catalog port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use relay_core::{BackendConfig, CatalogEntry, CatalogError, ModelCatalog, ModelCatalogSource};

/// Ollama's installed-model listing endpoint.
pub const TAGS_PATH: &str = "/api/tags";

/// Queries `GET /api/tags` on a backend.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
}

impl HttpCatalogClient {
    /// Build a client whose every call is bounded by `timeout`.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ModelCatalogSource for HttpCatalogClient {
    async fn list_models(&self, backend: &BackendConfig) -> Result<Vec<CatalogEntry>, CatalogError> {
        let url = format!("{}{TAGS_PATH}", backend.base_url());
        debug!(backend = %backend.name, %url, "Querying model catalog");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let catalog: ModelCatalog = response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;
        Ok(catalog.models)
    }
}
