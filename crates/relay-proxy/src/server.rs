//! Axum HTTP server for the relay.
//!
//! [`create_router`] assembles the routes; [`serve`] runs them on a pre-bound
//! listener until the cancellation token fires.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use reqwest::Client;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use relay_core::{AuditSink, Authenticator, RelayConfig};
use relay_routing::BackendSelector;

use crate::audit::AuditDispatcher;
use crate::auth::{StaticTokenAuthenticator, require_bearer};
use crate::forward::Forwarder;
use crate::{handler, health};

/// Errors starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Largest body buffered for model extraction (256 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 256 * 1024 * 1024;

/// Shared application state for the relay.
#[derive(Debug, Clone)]
pub struct ProxyState {
    pub config: Arc<RelayConfig>,
    pub selector: BackendSelector,
    pub forwarder: Forwarder,
    pub audit: AuditDispatcher,
    /// Client for `/health` probes, bounded by the health timeout.
    pub health_client: Client,
    /// `None` disables authentication.
    pub authenticator: Option<Arc<dyn Authenticator>>,
    /// Cap on bodies read to find the model name. Other bodies are streamed.
    pub body_limit: usize,
}

impl ProxyState {
    /// Wire the HTTP adapters from configuration. Starts the audit consumer
    /// task, so this must run inside a Tokio runtime.
    pub fn from_config(
        config: Arc<RelayConfig>,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Result<Self, ServerError> {
        let timeouts = config.timeouts;
        let selector = BackendSelector::with_http(config.clone())?;
        let forwarder = Forwarder::new(timeouts.request)?;
        let health_client = Client::builder().timeout(timeouts.health).build()?;
        let audit = AuditDispatcher::from_config(&config.audit, audit_sink);
        let authenticator: Option<Arc<dyn Authenticator>> = config
            .auth
            .enabled
            .then(|| Arc::new(StaticTokenAuthenticator::from_config(&config.auth)) as _);

        Ok(Self {
            config,
            selector,
            forwarder,
            audit,
            health_client,
            authenticator,
            body_limit: DEFAULT_BODY_LIMIT,
        })
    }

    #[must_use]
    pub fn with_forwarder(mut self, forwarder: Forwarder) -> Self {
        self.forwarder = forwarder;
        self
    }

    #[must_use]
    pub fn with_selector(mut self, selector: BackendSelector) -> Self {
        self.selector = selector;
        self
    }

    #[must_use]
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Option<Arc<dyn Authenticator>>) -> Self {
        self.authenticator = authenticator;
        self
    }
}

/// Build the relay router.
///
/// `/up` and `/health` are answered locally; everything else falls through
/// to the proxy handler. When an authenticator is configured, every
/// non-public path requires a bearer token.
pub fn create_router(state: ProxyState) -> Router {
    let mut router = Router::new()
        .route("/up", get(health::up))
        .route("/health", get(health::health))
        .fallback(handler::proxy);

    if let Some(authenticator) = state.authenticator.clone() {
        router = router.layer(middleware::from_fn_with_state(authenticator, require_bearer));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Start the relay with a pre-bound listener.
///
/// Runs until `cancel` is triggered, then stops accepting connections and
/// waits for in-flight requests to finish.
pub async fn serve(
    listener: TcpListener,
    state: ProxyState,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    let backends = state.config.enabled_local_backends().count();
    info!(%addr, backends, auth = state.authenticator.is_some(), "Relay listening");

    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;

    info!("Relay shut down");
    Ok(())
}
