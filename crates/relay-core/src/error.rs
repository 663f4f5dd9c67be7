//! Runtime routing errors.

use thiserror::Error;

/// Errors raised while choosing a backend for a request.
///
/// Estimation and probing failures never surface here; they degrade to
/// fallback values inside the routing chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No local backend is enabled, so there is nothing to fall back to.
    #[error("No enabled servers configured")]
    NoEnabledBackends,
}
