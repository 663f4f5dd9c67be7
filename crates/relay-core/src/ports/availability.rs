//! Availability probe port.

use async_trait::async_trait;
use std::fmt;

use crate::config::BackendConfig;

/// Point-in-time liveness and latency check for one backend.
///
/// Implementations must not retry and must bound their own duration; the
/// selector calls this for every candidate on every request.
#[async_trait]
pub trait AvailabilityProbe: Send + Sync + fmt::Debug {
    /// `true` only when the backend answered successfully and quickly enough.
    /// Any failure is reported as `false`.
    async fn is_available(&self, backend: &BackendConfig) -> bool;
}
