//! Authentication port.

use async_trait::async_trait;
use std::fmt;

use crate::domain::CurrentUser;

/// Resolves a bearer token to a caller.
///
/// Returns `None` for unknown, inactive or blank credentials. The router
/// never validates credentials itself; it only reads the resolved user.
#[async_trait]
pub trait Authenticator: Send + Sync + fmt::Debug {
    async fn authenticate(&self, token: &str) -> Option<CurrentUser>;
}
