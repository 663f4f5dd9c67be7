//! Subcommands and their arguments.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/relay.yaml";

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the relay (default)
    Serve(ServeArgs),

    /// Validate the config file and print the backend table
    CheckConfig(ConfigArgs),

    /// Print the SHA-256 digest of an API token for the config file
    HashToken {
        /// Token to hash
        token: String,
    },
}

/// Location of the config file.
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Path to the YAML config file
    #[arg(long, env = "RELAY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Address to bind, overrides `listen.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind, overrides `listen.port`
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
}
