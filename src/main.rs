//! vsai - terminal client for an AI board game server.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;
use vsai_client::{AiMode, ClientConfig, Oracle, RestOracle, Variant};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = ClientConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Command::Play {
            variant,
            server_url,
            ai_mode,
            side,
        } => {
            let mut config = config;
            if let Some(url) = server_url {
                config = config.with_server_url(url);
            }
            if let Some(mode) = ai_mode {
                config = config.with_ai_mode(AiMode(mode));
            }
            if let Some(side) = side {
                config = config.with_player_side(side);
            }
            run_play(config, variant).await
        }
        Command::Stats {
            variant,
            server_url,
        } => {
            let config = match server_url {
                Some(url) => config.with_server_url(url),
                None => config,
            };
            run_stats(config, variant).await
        }
    }
}

/// Runs the TUI with logging sent to a file.
async fn run_play(config: ClientConfig, variant: Option<Variant>) -> Result<()> {
    // Log to a file so output does not interfere with the TUI
    let log_file = std::fs::File::create(config.log_file())
        .with_context(|| format!("creating log file {}", config.log_file().display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();

    let oracle = RestOracle::with_timeout(config.server_url(), config.request_timeout())
        .context("building HTTP client")?;
    vsai_client::tui::run_tui(config, Arc::new(oracle), variant).await
}

/// Prints the statistics payload for one game.
#[instrument(skip(config))]
async fn run_stats(config: ClientConfig, variant: Variant) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let oracle = RestOracle::with_timeout(config.server_url(), config.request_timeout())
        .context("building HTTP client")?;
    info!(server_url = %oracle.base_url(), "Fetching stats");
    let stats = oracle
        .stats(variant)
        .await
        .with_context(|| format!("fetching stats for {}", variant.title()))?;

    println!("{}", variant.title());
    println!("  Games played: {}", stats.total_games);
    println!("  Player wins:  {}", stats.player_wins);
    println!("  AI wins:      {}", stats.ai_wins);
    println!("  Draws:        {}", stats.draws);
    println!("  Win rate:     {:.1}%", stats.win_rate);
    Ok(())
}
