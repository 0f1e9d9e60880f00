//! Command-line interface for vsai.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vsai_client::{PlayerSide, Variant};

/// vsai - Play board games against a remote AI
#[derive(Parser, Debug)]
#[command(name = "vsai")]
#[command(about = "Terminal client for an AI board game server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "vsai.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the terminal UI
    Play {
        /// Game to open directly (tictactoe, connect-four, checkers, chess).
        /// Shows the menu if omitted.
        #[arg(long)]
        variant: Option<Variant>,

        /// Game server URL
        #[arg(long)]
        server_url: Option<String>,

        /// AI algorithm index (0 = Minimax)
        #[arg(long)]
        ai_mode: Option<u8>,

        /// Side to play in checkers (white or black)
        #[arg(long)]
        side: Option<PlayerSide>,
    },

    /// Print aggregate statistics for a game
    Stats {
        /// Game to report on
        #[arg(long)]
        variant: Variant,

        /// Game server URL
        #[arg(long)]
        server_url: Option<String>,
    },
}
