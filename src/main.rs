//! Binaural CLI - Two-Tone Beat Generator
//!
//! Command-line interface for the binaural beat generator.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use binaural::cli::{commands, dial, Cli, Commands};
use binaural::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout belongs to the commands
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Binaural v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "invalid default config".to_string(),
    })?;

    match cli.command {
        Some(cmd) => handle_command(cmd, &config),
        None => {
            println!("Binaural v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: &Config) -> anyhow::Result<()> {
    match cmd {
        Commands::Presets => commands::list_presets()?,
        Commands::Map { preset, angle } => commands::map(config, &preset, angle)
            .with_context(|| format!("failed to map {} at {} degrees", preset, angle))?,
        Commands::Play { preset, seconds } => {
            commands::play(config, &preset, seconds).context("playback failed")?
        }
        Commands::Sweep {
            preset,
            degrees,
            seconds,
        } => commands::sweep(config, &preset, degrees, seconds).context("sweep failed")?,
        Commands::Dial => dial::run(config)?,
    }
    Ok(())
}
