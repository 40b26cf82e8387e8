//! Bracketology - Main Entry Point

use bracketology::cli::{cmd_config, cmd_info, cmd_run, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bracketology=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { teams, games, config, output, n_estimators } => {
            cmd_run(&teams, &games, config.as_deref(), output.as_deref(), n_estimators)?;
        }
        Commands::Info { teams, config } => {
            cmd_info(&teams, config.as_deref())?;
        }
        Commands::Config => {
            cmd_config()?;
        }
    }

    Ok(())
}
