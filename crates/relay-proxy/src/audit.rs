//! Best-effort audit dispatch.
//!
//! Handlers hand events to an [`AuditDispatcher`], which queues them on a
//! bounded channel drained by a background task. A full queue drops the event;
//! a failing sink is logged. Neither ever reaches the request path.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use relay_core::{AuditConfig, AuditError, AuditEvent, AuditSink};

/// Log target for audit lines.
pub const AUDIT_TARGET: &str = "relay::audit";

/// Non-blocking handle for submitting audit events.
#[derive(Debug, Clone)]
pub struct AuditDispatcher {
    tx: Option<mpsc::Sender<AuditEvent>>,
}

impl AuditDispatcher {
    /// Start a consumer task that feeds `sink`. Must be called inside a Tokio runtime.
    pub fn spawn(sink: Arc<dyn AuditSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditEvent>(capacity.max(1));
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = sink.record(event).await {
                    error!("Failed to log request: {e}");
                }
            }
        });
        Self { tx: Some(tx) }
    }

    /// A dispatcher that discards every event.
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn from_config(config: &AuditConfig, sink: Arc<dyn AuditSink>) -> Self {
        if config.enabled {
            Self::spawn(sink, config.queue_capacity)
        } else {
            Self::disabled()
        }
    }

    /// Queue an event without waiting.
    pub fn dispatch(&self, event: AuditEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(request_id = %event.request_id, "Audit queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                warn!(request_id = %event.request_id, "Audit consumer stopped, dropping event");
            }
        }
    }
}

/// Writes each event as a structured log line under [`AUDIT_TARGET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let user = event.user.as_deref().unwrap_or("-");
        let model = event.model_name.as_deref().unwrap_or("unknown");
        let backend = event.backend_used.as_deref().unwrap_or("-");

        if event.is_error() {
            warn!(
                target: AUDIT_TARGET,
                request_id = %event.request_id,
                user,
                method = %event.http_method,
                path = %event.path,
                model,
                backend,
                status = event.http_status,
                duration_ms = event.duration_ms,
                error = event.error_message.as_deref().unwrap_or(""),
                "request failed"
            );
        } else {
            info!(
                target: AUDIT_TARGET,
                request_id = %event.request_id,
                user,
                method = %event.http_method,
                path = %event.path,
                model,
                backend,
                status = event.http_status,
                duration_ms = event.duration_ms,
                "request"
            );
        }
        Ok(())
    }
}

/// Keeps events in memory. Used by tests and embedders that inspect traffic.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until at least `count` events arrived or `timeout` passed.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<AuditEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let events = self.events();
            if events.len() >= count || Instant::now() >= deadline {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }
}
