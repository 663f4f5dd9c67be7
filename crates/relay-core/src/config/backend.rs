//! Backend descriptions.

use serde::Deserialize;

/// Priority used for backends without an operator-assigned rank.
pub const UNRANKED_PRIORITY: i64 = 999;

/// Which configured set a backend came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Entry from `servers`. Eligible for automatic selection.
    #[default]
    Local,
    /// Entry from `external_hosts`. Reachable only through explicit assignment.
    External,
}

/// One configured inference backend.
///
/// Immutable after load. The `kind` is not part of the file format; it is
/// assigned from the list the entry was declared in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Unique backend name.
    pub name: String,
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// URL scheme used for every call to this backend.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Disabled backends are never selected or probed.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Operator rank, lower is preferred.
    #[serde(default)]
    pub priority: Option<i64>,
    /// Largest model (in GB) this backend accepts during automatic selection.
    #[serde(default)]
    pub max_memory_gb: Option<f64>,
    /// Environment variable holding a bearer token for upstream calls.
    #[serde(default, alias = "api_key_env_var")]
    pub api_key_env: Option<String>,
    #[serde(skip)]
    pub kind: BackendKind,
}

fn default_protocol() -> String {
    "http".to_string()
}

const fn default_enabled() -> bool {
    true
}

impl BackendConfig {
    /// Create an enabled local backend with default protocol and no limits.
    pub fn local(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            protocol: default_protocol(),
            enabled: true,
            priority: None,
            max_memory_gb: None,
            api_key_env: None,
            kind: BackendKind::Local,
        }
    }

    /// Create an enabled external backend.
    pub fn external(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            kind: BackendKind::External,
            ..Self::local(name, host, port)
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub const fn with_max_memory_gb(mut self, max_memory_gb: f64) -> Self {
        self.max_memory_gb = Some(max_memory_gb);
        self
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    #[must_use]
    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// `{protocol}://{host}:{port}` with no trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    /// Rank used for ordering; unranked backends sort after all ranked ones.
    pub fn effective_priority(&self) -> i64 {
        self.priority.unwrap_or(UNRANKED_PRIORITY)
    }

    /// Whether a model needing `required_gb` fits under this backend's ceiling.
    pub fn fits_memory(&self, required_gb: f64) -> bool {
        self.max_memory_gb.is_none_or(|max| required_gb <= max)
    }

    pub const fn is_external(&self) -> bool {
        matches!(self.kind, BackendKind::External)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_uses_protocol_host_and_port() {
        let backend = BackendConfig::local("hp", "localhost", 11435);
        assert_eq!(backend.base_url(), "http://localhost:11435");

        let external = BackendConfig::external("openai", "api.openai.com", 443).with_protocol("https");
        assert_eq!(external.base_url(), "https://api.openai.com:443");
        assert!(external.is_external());
    }

    #[test]
    fn test_unranked_backends_sort_last() {
        let ranked = BackendConfig::local("a", "h", 1).with_priority(5);
        let unranked = BackendConfig::local("b", "h", 2);
        assert_eq!(ranked.effective_priority(), 5);
        assert_eq!(unranked.effective_priority(), UNRANKED_PRIORITY);
    }

    #[test]
    fn test_fits_memory() {
        let unlimited = BackendConfig::local("a", "h", 1);
        assert!(unlimited.fits_memory(500.0));

        let legacy = BackendConfig::local("b", "h", 2).with_max_memory_gb(8.0);
        assert!(legacy.fits_memory(8.0));
        assert!(legacy.fits_memory(4.5));
        assert!(!legacy.fits_memory(15.0));
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let backend: BackendConfig =
            serde_yaml::from_str("{ name: hp, host: localhost, port: 11435 }").unwrap();
        assert_eq!(backend.protocol, "http");
        assert!(backend.enabled);
        assert_eq!(backend.priority, None);
        assert_eq!(backend.max_memory_gb, None);
        assert_eq!(backend.kind, BackendKind::Local);
    }
}
