//! tabprep - Main Entry Point

use clap::Parser;
use tabprep::cli::{cmd_apply, cmd_fit, cmd_inspect, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabprep=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fit { data, artifact, output, config, strict } => {
            cmd_fit(&data, artifact.as_deref(), output.as_deref(), config.as_deref(), strict)?;
        }
        Commands::Apply { data, artifact, output } => {
            cmd_apply(&data, &artifact, output.as_deref())?;
        }
        Commands::Inspect { artifact } => {
            cmd_inspect(&artifact)?;
        }
    }

    Ok(())
}
