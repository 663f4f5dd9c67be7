//! Per-request audit record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of one proxied request, handed to an [`AuditSink`](crate::ports::AuditSink).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Authenticated caller, when auth is enabled.
    pub user: Option<String>,
    pub http_method: String,
    pub path: String,
    pub model_name: Option<String>,
    /// Name of the backend the request was sent to, if one was chosen.
    pub backend_used: Option<String>,
    pub http_status: u16,
    pub duration_ms: f64,
    pub error_message: Option<String>,
}

impl AuditEvent {
    /// Start an event for a request; outcome fields are filled in afterwards.
    pub fn new(http_method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user: None,
            http_method: http_method.into(),
            path: path.into(),
            model_name: None,
            backend_used: None,
            http_status: 0,
            duration_ms: 0.0,
            error_message: None,
        }
    }

    /// Failed requests: error status or a recorded error.
    pub const fn is_error(&self) -> bool {
        self.http_status >= 400 || self.error_message.is_some()
    }
}
