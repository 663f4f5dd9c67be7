//! Relay configuration.
//!
//! The YAML file is deserialized into [`ConfigFile`] and then validated into
//! an immutable [`RelayConfig`]. Everything downstream receives a shared
//! reference to the validated value; nothing reads configuration globally.

mod backend;
mod error;
mod file;
mod model;

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub use backend::{BackendConfig, BackendKind, UNRANKED_PRIORITY};
pub use error::ConfigError;
pub use file::{
    AuditConfig, AuthConfig, ConfigFile, DEFAULT_PROXY_PORT, ListenConfig, MemoryPatternFile,
    ModelConfigFile, UserEntry,
};
pub use model::{MemoryRule, ModelConfig};

use model::validate_memory;

/// Timeouts and thresholds applied to outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Forwarded request, end to end.
    pub request: Duration,
    /// One model catalog query.
    pub model_info: Duration,
    /// One availability probe.
    pub probe: Duration,
    /// Probe round-trip at or above which a backend counts as busy.
    pub busy_threshold: Duration,
    /// One `/health` probe.
    pub health: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(file::DEFAULT_REQUEST_TIMEOUT_SECS),
            model_info: Duration::from_secs(file::DEFAULT_MODEL_INFO_TIMEOUT_SECS),
            probe: Duration::from_millis(file::DEFAULT_PROBE_TIMEOUT_MS),
            busy_threshold: Duration::from_millis(file::DEFAULT_BUSY_THRESHOLD_MS),
            health: Duration::from_secs(file::DEFAULT_HEALTH_TIMEOUT_SECS),
        }
    }
}

/// Validated, read-only relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub listen: ListenConfig,
    pub model: ModelConfig,
    pub timeouts: Timeouts,
    pub auth: AuthConfig,
    pub audit: AuditConfig,
    /// Locals in declaration order, then externals in declaration order.
    backends: Vec<BackendConfig>,
    index: HashMap<String, usize>,
}

impl RelayConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_file(file)
    }

    /// Validate an already deserialized config file.
    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let mut backends = Vec::with_capacity(file.servers.len() + file.external_hosts.len());
        let locals = file.servers.into_iter().map(|b| (b, BackendKind::Local));
        let externals = file
            .external_hosts
            .into_iter()
            .map(|b| (b, BackendKind::External));

        let mut index = HashMap::new();
        for (mut backend, kind) in locals.chain(externals) {
            backend.kind = kind;
            validate_backend(&backend)?;
            if index.contains_key(&backend.name) {
                return Err(ConfigError::DuplicateBackend(backend.name));
            }
            index.insert(backend.name.clone(), backends.len());
            backends.push(backend);
        }

        let model = build_model_config(file.model_config)?;

        for (model_name, target) in &model.explicit_assignments {
            if !index.contains_key(target) {
                return Err(ConfigError::UnknownAssignmentTarget {
                    model: model_name.clone(),
                    backend: target.clone(),
                });
            }
        }

        let timeouts = Timeouts {
            request: Duration::from_secs(file.request_timeout),
            model_info: Duration::from_secs(file.model_info_timeout),
            probe: Duration::from_millis(file.probe_timeout_ms),
            busy_threshold: Duration::from_millis(file.server_busy_threshold_ms),
            health: Duration::from_secs(file.health_timeout),
        };

        Ok(Self {
            listen: file.listen,
            model,
            timeouts,
            auth: file.auth,
            audit: file.audit,
            backends,
            index,
        })
    }

    /// Build a config directly from backends, mainly for tests and embedding.
    ///
    /// Names must be unique; later duplicates are rejected like in a file.
    pub fn from_backends(
        backends: impl IntoIterator<Item = BackendConfig>,
        model: ModelConfig,
        timeouts: Timeouts,
    ) -> Result<Self, ConfigError> {
        let mut list: Vec<BackendConfig> = backends.into_iter().collect();
        // Keep locals ahead of externals, each in the order given.
        list.sort_by_key(BackendConfig::is_external);

        let mut index = HashMap::new();
        for (i, backend) in list.iter().enumerate() {
            validate_backend(backend)?;
            if index.insert(backend.name.clone(), i).is_some() {
                return Err(ConfigError::DuplicateBackend(backend.name.clone()));
            }
        }
        for (model_name, target) in &model.explicit_assignments {
            if !index.contains_key(target) {
                return Err(ConfigError::UnknownAssignmentTarget {
                    model: model_name.clone(),
                    backend: target.clone(),
                });
            }
        }

        Ok(Self {
            listen: ListenConfig::default(),
            model,
            timeouts,
            auth: AuthConfig {
                enabled: false,
                users: Vec::new(),
            },
            audit: AuditConfig::default(),
            backends: list,
            index,
        })
    }

    /// Every configured backend, locals first.
    pub fn backends(&self) -> &[BackendConfig] {
        &self.backends
    }

    /// Local backends in declaration order.
    pub fn local_backends(&self) -> impl Iterator<Item = &BackendConfig> {
        self.backends.iter().filter(|b| !b.is_external())
    }

    /// Enabled local backends in declaration order.
    pub fn enabled_local_backends(&self) -> impl Iterator<Item = &BackendConfig> {
        self.local_backends().filter(|b| b.enabled)
    }

    /// External backends in declaration order.
    pub fn external_backends(&self) -> impl Iterator<Item = &BackendConfig> {
        self.backends.iter().filter(|b| b.is_external())
    }

    /// Look up a backend of either kind by name.
    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.index.get(name).map(|&i| &self.backends[i])
    }

    /// Backend a model is explicitly assigned to, whether or not it is enabled.
    pub fn resolve_assignment(&self, model_name: &str) -> Option<&BackendConfig> {
        self.model
            .explicit_assignments
            .get(model_name)
            .and_then(|target| self.backend(target))
    }

    /// Fail when there is no enabled local backend to route to.
    pub fn ensure_routable(&self) -> Result<(), ConfigError> {
        if self.enabled_local_backends().next().is_some() {
            Ok(())
        } else {
            Err(ConfigError::NoEnabledBackends)
        }
    }
}

fn validate_backend(backend: &BackendConfig) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBackend {
        name: backend.name.clone(),
        reason: reason.to_string(),
    };
    if backend.name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if backend.host.trim().is_empty() {
        return Err(invalid("host is empty"));
    }
    if backend.port == 0 {
        return Err(invalid("port must be non-zero"));
    }
    if backend.protocol.trim().is_empty() {
        return Err(invalid("protocol is empty"));
    }
    if let Some(max) = backend.max_memory_gb {
        validate_memory(&format!("backend '{}'", backend.name), max)?;
    }
    Ok(())
}

fn build_model_config(file: ModelConfigFile) -> Result<ModelConfig, ConfigError> {
    validate_memory("default_memory_gb", file.default_memory_gb)?;
    for (name, gb) in &file.memory_overrides {
        validate_memory(&format!("override '{name}'"), *gb)?;
    }
    let memory_patterns = file
        .memory_patterns
        .iter()
        .map(|p| MemoryRule::new(&p.pattern, p.memory_gb))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ModelConfig {
        explicit_assignments: file.explicit_assignments,
        memory_overrides: file.memory_overrides,
        memory_patterns,
        default_memory_gb: file.default_memory_gb,
        cache_enabled: file.cache_model_info,
        cache_ttl: Duration::from_secs(file.cache_ttl_seconds),
    })
}
