//! `serve`: run the relay until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use relay_proxy::{ProxyState, TracingAuditSink, serve};

use crate::commands::ServeArgs;
use crate::handlers::load_routable_config;

pub async fn execute(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_routable_config(&args.config.config)?;

    let host = args.host.clone().unwrap_or_else(|| config.listen.host.clone());
    let port = args.port.unwrap_or(config.listen.port);
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;

    let state = ProxyState::from_config(Arc::new(config), Arc::new(TracingAuditSink))?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        info!("Shutdown signal received");
        shutdown.cancel();
    });

    serve(listener, state, cancel).await?;
    Ok(())
}
