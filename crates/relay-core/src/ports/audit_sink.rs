//! Audit sink port.
//!
//! Receives one [`AuditEvent`] per proxied request. Sinks are called off the
//! request path, so a slow or failing sink never affects responses.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::domain::AuditEvent;

/// Failure to store an audit event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync + fmt::Debug {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}
