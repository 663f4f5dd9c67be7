use serde::Serialize;

/// Caller identity established by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub name: String,
}

impl CurrentUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
