//! Model catalog as reported by a backend's `/api/tags` endpoint.

use serde::{Deserialize, Serialize};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// One model a backend reports as installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    /// Size on disk in bytes.
    #[serde(default)]
    pub size: Option<u64>,
}

/// `/api/tags` response body. Extra fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default)]
    pub models: Vec<CatalogEntry>,
}

impl CatalogEntry {
    /// Reported size in GB, when the backend sent one.
    pub fn size_gb(&self) -> Option<f64> {
        self.size.map(bytes_to_gb)
    }
}

/// Bytes to GB (2^30), rounded to one decimal.
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_gb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_GB * 10.0).round() / 10.0
}
