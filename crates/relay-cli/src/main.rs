//! CLI entry point - the composition root.

use clap::Parser;

use relay_cli::{Cli, Commands, handlers, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API keys for external hosts usually live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.into_command() {
        Commands::Serve(args) => handlers::serve::execute(&args).await?,
        Commands::CheckConfig(args) => handlers::check_config::execute(&args)?,
        Commands::HashToken { token } => handlers::hash_token::execute(&token),
    }
    Ok(())
}
