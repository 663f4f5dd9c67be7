//! Root CLI parser and global options.

use clap::Parser;

use crate::commands::{Commands, ServeArgs};

/// Model-aware reverse proxy for Ollama servers.
///
/// Running without a subcommand is the same as `serve`.
#[derive(Debug, Parser)]
#[command(name = "ollama-relay")]
#[command(about = "Route Ollama API requests to the best available backend")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run, defaulting to `serve` with top-level options.
    pub fn into_command(self) -> Commands {
        self.command.unwrap_or(Commands::Serve(self.serve))
    }
}
