//! Subcommand handlers.

pub mod check_config;
pub mod hash_token;
pub mod serve;

use std::path::Path;

use anyhow::Context;
use relay_core::RelayConfig;

/// Load and validate the config file, refusing configs with nothing to route to.
pub fn load_routable_config(path: &Path) -> anyhow::Result<RelayConfig> {
    let config = RelayConfig::load(path)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    config
        .ensure_routable()
        .with_context(|| format!("Cannot route with configuration {}", path.display()))?;
    Ok(config)
}
