//! Configuration loading and validation errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating the relay configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },

    /// The config file is not valid YAML or has an unexpected shape.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Two backends share a name (names are unique across servers and external hosts).
    #[error("Backend name '{0}' is defined more than once")]
    DuplicateBackend(String),

    /// A backend entry is unusable.
    #[error("Invalid backend '{name}': {reason}")]
    InvalidBackend { name: String, reason: String },

    /// A memory pattern is not a valid regular expression.
    #[error("Invalid memory pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A memory value is not a finite positive number.
    #[error("Invalid memory value for {context}: {value}")]
    InvalidMemory { context: String, value: f64 },

    /// An explicit assignment points at a backend that does not exist.
    #[error("Model '{model}' is assigned to unknown backend '{backend}'")]
    UnknownAssignmentTarget { model: String, backend: String },

    /// No local backend is enabled.
    #[error("No enabled servers configured")]
    NoEnabledBackends,
}
