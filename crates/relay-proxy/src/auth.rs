//! Bearer token authentication.
//!
//! Tokens are never stored. The config holds the SHA-256 digest of each
//! user's token and incoming tokens are hashed before lookup.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use tracing::warn;

use relay_core::{AuthConfig, Authenticator, CurrentUser};

/// Path prefixes served without authentication.
pub const PUBLIC_PATH_PREFIXES: &[&str] = &["/health", "/up", "/users"];

/// Lowercase hex SHA-256 of a token, as stored in `auth.users[].token_sha256`.
pub fn digest_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Authenticates against the users listed in the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    /// Digest to user name, active users only.
    by_digest: HashMap<String, String>,
}

impl StaticTokenAuthenticator {
    pub fn from_config(config: &AuthConfig) -> Self {
        let by_digest = config
            .users
            .iter()
            .filter(|u| u.active)
            .map(|u| (u.token_sha256.trim().to_ascii_lowercase(), u.name.clone()))
            .collect();
        Self { by_digest }
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Option<CurrentUser> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        self.by_digest
            .get(&digest_token(token))
            .map(CurrentUser::new)
    }
}

pub(crate) fn is_public_path(path: &str) -> bool {
    PUBLIC_PATH_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(value: &HeaderValue) -> Option<&str> {
    let value = value.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn unauthorized() -> Response {
    let mut res = StatusCode::UNAUTHORIZED.into_response();
    res.headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    res
}

/// Auth middleware: require a valid bearer token on every non-public path.
///
/// On success the resolved [`CurrentUser`] is added to the request extensions.
/// Returns 401 with `WWW-Authenticate: Bearer` otherwise.
pub async fn require_bearer(
    State(authenticator): State<Arc<dyn Authenticator>>,
    mut req: Request,
    next: Next,
) -> Response {
    if is_public_path(req.uri().path()) {
        return next.run(req).await;
    }

    let token = req.headers().get(header::AUTHORIZATION).and_then(bearer_token);
    let user = match token {
        Some(token) => authenticator.authenticate(token).await,
        None => None,
    };

    match user {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => {
            warn!(
                path = %req.uri().path(),
                "Unauthorized request - missing or invalid token"
            );
            unauthorized()
        }
    }
}
