//! Catch-all proxy handler.

use std::time::Instant;

use axum::{
    Extension,
    body::{Body, HttpBody, to_bytes},
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{debug, error, info};

use relay_core::{AuditEvent, CurrentUser, duration_ms};

use crate::auth::is_public_path;
use crate::error::ProxyError;
use crate::extract::{extract_model_name, reads_body};
use crate::forward::{ProxyBody, ProxyRequest};
use crate::server::ProxyState;

/// Route one request to a backend and relay the answer.
///
/// Every proxied request produces exactly one audit event, including failed
/// ones. Failures reach the caller only as a generic 500.
pub async fn proxy(
    State(state): State<ProxyState>,
    user: Option<Extension<CurrentUser>>,
    req: Request,
) -> Response {
    // Health and account paths belong to other handlers and are never proxied.
    if is_public_path(req.uri().path()) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let started = Instant::now();
    let mut event = AuditEvent::new(req.method().as_str(), req.uri().path());
    event.user = user.map(|Extension(u)| u.name);

    let result = route(&state, req, &mut event).await;
    event.duration_ms = duration_ms(started.elapsed());

    let response = match result {
        Ok(response) => {
            event.http_status = response.status().as_u16();
            debug!(
                status = event.http_status,
                duration_ms = event.duration_ms,
                "Upstream responded"
            );
            response
        }
        Err(err) => {
            error!(
                model = event.model_name.as_deref().unwrap_or("unknown"),
                backend = event.backend_used.as_deref().unwrap_or("-"),
                error = %err,
                "Proxy error"
            );
            event.http_status = StatusCode::INTERNAL_SERVER_ERROR.as_u16();
            event.error_message = Some(err.to_string());
            err.into_response()
        }
    };

    state.audit.dispatch(event);
    response
}

async fn route(
    state: &ProxyState,
    req: Request,
    event: &mut AuditEvent,
) -> Result<Response, ProxyError> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();
    let query = parts.uri.query().map(str::to_string);

    let body = inbound_body(&path, body, state.body_limit).await?;
    event.model_name = extract_model_name(&path, query.as_deref(), body.as_bytes());

    let selected = state.selector.select(event.model_name.as_deref()).await?;
    event.backend_used = Some(selected.backend.name.clone());
    info!(
        backend = %selected.backend.name,
        model = event.model_name.as_deref().unwrap_or("unknown"),
        reason = %selected.reason,
        "Routing request"
    );

    let request = ProxyRequest {
        method: parts.method,
        path,
        query,
        headers: parts.headers,
        body,
    };
    Ok(state.forwarder.forward(request, &selected.backend).await?)
}

/// Buffer the body when it may name the model, stream it otherwise.
async fn inbound_body(path: &str, body: Body, limit: usize) -> Result<ProxyBody, ProxyError> {
    if reads_body(path) {
        let bytes = to_bytes(body, limit)
            .await
            .map_err(|e| ProxyError::BodyRead(e.to_string()))?;
        return Ok(ProxyBody::Buffered(bytes));
    }
    if body.size_hint().exact() == Some(0) {
        return Ok(ProxyBody::Buffered(Bytes::new()));
    }
    Ok(ProxyBody::Streaming(body))
}
