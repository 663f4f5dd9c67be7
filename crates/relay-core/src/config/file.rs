//! On-disk configuration shape.
//!
//! These types mirror the YAML file one-to-one and carry the defaults.
//! They are validated into [`RelayConfig`](super::RelayConfig) before use.

use std::collections::HashMap;

use serde::Deserialize;

use super::backend::BackendConfig;

/// Default port the relay listens on (the port Ollama clients expect).
pub const DEFAULT_PROXY_PORT: u16 = 11434;

/// Memory assumed for a model nothing else knows about.
pub const DEFAULT_MEMORY_GB: f64 = 4.5;

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_MODEL_INFO_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BUSY_THRESHOLD_MS: u64 = 1000;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1024;

/// Top-level config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub listen: ListenConfig,
    /// Local backends, in preference order for fallback.
    pub servers: Vec<BackendConfig>,
    #[serde(default)]
    pub external_hosts: Vec<BackendConfig>,
    #[serde(default)]
    pub model_config: ModelConfigFile,
    /// Upstream forward timeout, seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Model catalog query timeout, seconds.
    #[serde(default = "default_model_info_timeout")]
    pub model_info_timeout: u64,
    /// Probe round-trip above which a backend counts as busy, milliseconds.
    #[serde(default = "default_busy_threshold")]
    pub server_busy_threshold_ms: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
    /// `/health` probe timeout, seconds.
    #[serde(default = "default_health_timeout")]
    pub health_timeout: u64,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Address the relay binds to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenConfig {
    #[serde(default = "default_listen_host")]
    pub host: String,
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_listen_host(),
            port: DEFAULT_PROXY_PORT,
        }
    }
}

/// Model routing and memory rules as written in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfigFile {
    #[serde(default)]
    pub explicit_assignments: HashMap<String, String>,
    #[serde(default)]
    pub memory_overrides: HashMap<String, f64>,
    /// Evaluated top to bottom, first match wins.
    #[serde(default)]
    pub memory_patterns: Vec<MemoryPatternFile>,
    #[serde(default = "default_memory_gb")]
    pub default_memory_gb: f64,
    #[serde(default)]
    pub cache_model_info: bool,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

impl Default for ModelConfigFile {
    fn default() -> Self {
        Self {
            explicit_assignments: HashMap::new(),
            memory_overrides: HashMap::new(),
            memory_patterns: Vec::new(),
            default_memory_gb: DEFAULT_MEMORY_GB,
            cache_model_info: false,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}

/// One `memory_patterns` entry before compilation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryPatternFile {
    pub pattern: String,
    pub memory_gb: f64,
}

/// Bearer token authentication settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            users: Vec::new(),
        }
    }
}

/// A caller allowed to use the relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEntry {
    pub name: String,
    /// Lowercase hex SHA-256 digest of the user's API token.
    pub token_sha256: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Request audit settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Events beyond this many in flight are dropped.
    #[serde(default = "default_audit_capacity")]
    pub queue_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_capacity: DEFAULT_AUDIT_QUEUE_CAPACITY,
        }
    }
}

fn default_listen_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_listen_port() -> u16 {
    DEFAULT_PROXY_PORT
}

const fn default_true() -> bool {
    true
}

const fn default_memory_gb() -> f64 {
    DEFAULT_MEMORY_GB
}

const fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

const fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

const fn default_model_info_timeout() -> u64 {
    DEFAULT_MODEL_INFO_TIMEOUT_SECS
}

const fn default_busy_threshold() -> u64 {
    DEFAULT_BUSY_THRESHOLD_MS
}

const fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT_MS
}

const fn default_health_timeout() -> u64 {
    DEFAULT_HEALTH_TIMEOUT_SECS
}

const fn default_audit_capacity() -> usize {
    DEFAULT_AUDIT_QUEUE_CAPACITY
}
