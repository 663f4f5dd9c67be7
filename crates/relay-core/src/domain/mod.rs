//! Values that flow through one routed request.

mod audit;
mod catalog;
mod selection;
mod user;

pub use audit::AuditEvent;
pub use catalog::{CatalogEntry, ModelCatalog, bytes_to_gb};
pub use selection::{SelectedBackend, SelectionReason};
pub use user::CurrentUser;

use std::time::Duration;

/// Milliseconds with two decimal places, as recorded in audit events.
pub fn duration_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}
