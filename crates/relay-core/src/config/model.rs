//! Validated model rules.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;

use super::error::ConfigError;
use super::file::{DEFAULT_CACHE_TTL_SECONDS, DEFAULT_MEMORY_GB};

/// A compiled `memory_patterns` entry.
#[derive(Debug, Clone)]
pub struct MemoryRule {
    pattern: Regex,
    memory_gb: f64,
}

impl MemoryRule {
    /// Compile a rule. The pattern is searched anywhere in the model name.
    pub fn new(pattern: &str, memory_gb: f64) -> Result<Self, ConfigError> {
        let compiled = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        validate_memory(&format!("pattern '{pattern}'"), memory_gb)?;
        Ok(Self {
            pattern: compiled,
            memory_gb,
        })
    }

    pub fn matches(&self, model_name: &str) -> bool {
        self.pattern.is_match(model_name)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub const fn memory_gb(&self) -> f64 {
        self.memory_gb
    }
}

/// Model routing and memory estimation rules.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model name to backend name. Bypasses automatic selection.
    pub explicit_assignments: HashMap<String, String>,
    /// Exact memory values per model name.
    pub memory_overrides: HashMap<String, f64>,
    /// Ordered, first match wins.
    pub memory_patterns: Vec<MemoryRule>,
    pub default_memory_gb: f64,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            explicit_assignments: HashMap::new(),
            memory_overrides: HashMap::new(),
            memory_patterns: Vec::new(),
            default_memory_gb: DEFAULT_MEMORY_GB,
            cache_enabled: false,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
        }
    }
}

impl ModelConfig {
    /// First pattern rule matching `model_name`.
    pub fn pattern_memory(&self, model_name: &str) -> Option<f64> {
        self.memory_patterns
            .iter()
            .find(|rule| rule.matches(model_name))
            .map(MemoryRule::memory_gb)
    }
}

pub(super) fn validate_memory(context: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidMemory {
            context: context.to_string(),
            value,
        })
    }
}
