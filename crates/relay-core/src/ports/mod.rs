//! Port definitions (trait abstractions) for external systems.
//!
//! Ports describe what the routing core needs from the outside world:
//! backend catalogs, liveness probes, audit storage and credential checks.
//! They use only domain types; HTTP clients live in the adapter crates.

pub mod audit_sink;
pub mod authenticator;
pub mod availability;
pub mod model_catalog;

pub use audit_sink::{AuditError, AuditSink};
pub use authenticator::Authenticator;
pub use availability::AvailabilityProbe;
pub use model_catalog::{CatalogError, ModelCatalogSource};
