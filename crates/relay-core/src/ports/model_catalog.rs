//! Model catalog port.
//!
//! Lists the models a backend has installed, with their on-disk size. The
//! memory estimator uses this as its live source of truth.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::domain::CatalogEntry;

/// Errors that can occur while querying a backend's catalog.
///
/// These never reach a caller; the estimator logs them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The backend could not be reached or did not answer in time.
    #[error("Catalog request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("Catalog request returned status {0}")]
    Status(u16),

    /// The body was not a model catalog.
    #[error("Malformed catalog response: {0}")]
    Malformed(String),
}

/// Port for listing the models installed on a backend.
#[async_trait]
pub trait ModelCatalogSource: Send + Sync + fmt::Debug {
    /// Query `backend` for its installed models.
    async fn list_models(&self, backend: &BackendConfig) -> Result<Vec<CatalogEntry>, CatalogError>;
}
