//! Core domain types, configuration and port definitions for ollama-relay.
//!
//! This crate has no HTTP dependencies. It describes the configured backends,
//! the values that flow through one routed request, and the trait boundaries
//! (ports) that the routing and proxy crates implement or call into.
#![deny(unsafe_code)]

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

pub use config::{
    AuditConfig, AuthConfig, BackendConfig, BackendKind, ConfigError, ConfigFile, ListenConfig,
    MemoryRule, ModelConfig, RelayConfig, Timeouts, UserEntry,
};
pub use domain::{
    AuditEvent, CatalogEntry, CurrentUser, ModelCatalog, SelectedBackend, SelectionReason,
    bytes_to_gb, duration_ms,
};
pub use error::RoutingError;
pub use ports::{
    AuditError, AuditSink, Authenticator, AvailabilityProbe, CatalogError, ModelCatalogSource,
};
