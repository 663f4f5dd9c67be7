//! Proxy error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use relay_core::RoutingError;

use crate::forward::ForwardError;

/// Failure while handling a proxied request.
///
/// The full message goes to logs and the audit event. Callers only ever see
/// a generic 500.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error("Failed to read request body: {0}")]
    BodyRead(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(ErrorBody {
                error: "Internal server error",
            }),
        )
            .into_response()
    }
}
