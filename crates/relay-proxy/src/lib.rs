//! Model-aware reverse proxy for Ollama-compatible backends.
//!
//! Every request outside the health and auth paths is routed to one backend
//! chosen by [`relay_routing::BackendSelector`], forwarded verbatim, and
//! recorded as an audit event.
//!
//! # Architecture
//!
//! - [`server`]: router assembly and the `serve` loop
//! - [`handler`]: the catch-all proxy handler
//! - [`extract`]: model name extraction from paths, queries and bodies
//! - [`forward`]: upstream request construction and response relay
//! - [`audit`]: best-effort audit dispatch off the request path
//! - [`auth`]: bearer token authentication
//! - [`health`]: `/health` and `/up`
#![deny(unsafe_code)]

pub mod audit;
pub mod auth;
pub mod error;
pub mod extract;
pub mod forward;
pub mod handler;
pub mod health;
pub mod server;

pub use audit::{AuditDispatcher, MemoryAuditSink, TracingAuditSink};
pub use auth::{StaticTokenAuthenticator, digest_token};
pub use error::ProxyError;
pub use extract::extract_model_name;
pub use forward::{ForwardError, Forwarder, ProxyBody, ProxyRequest, build_request_url};
pub use server::{DEFAULT_BODY_LIMIT, ProxyState, ServerError, create_router, serve};
