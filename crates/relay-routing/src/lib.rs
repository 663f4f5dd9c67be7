//! Routing engine for ollama-relay.
//!
//! Given a model name, decides which configured backend should serve the
//! request:
//!
//! - [`MemoryEstimator`] resolves the model's memory footprint from overrides,
//!   the [`MemoryCache`], live backend catalogs and pattern rules.
//! - [`HttpProbe`] checks whether a backend is up and responsive.
//! - [`BackendSelector`] combines both with explicit assignments and
//!   priorities to produce a [`SelectedBackend`](relay_core::SelectedBackend).
#![deny(unsafe_code)]

mod catalog;
mod estimator;
mod memory_cache;
mod prober;
mod selector;

pub use catalog::{HttpCatalogClient, TAGS_PATH};
pub use estimator::MemoryEstimator;
pub use memory_cache::MemoryCache;
pub use prober::{HttpProbe, ProbeReport, probe_root};
pub use selector::BackendSelector;
