//! Command-line interface for the breakroom binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Break Room - Connect Four and Mastermind played in chat
#[derive(Parser, Debug)]
#[command(name = "breakroom")]
#[command(about = "Chat game server for Connect Four and Mastermind", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (defaults apply when it is missing)
    #[arg(short, long, default_value = "breakroom.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server for slash commands and button presses
    Serve {
        /// Host to bind to, overriding the config
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to, overriding the config
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the configured themes for each game
    Themes,

    /// Show win/loss statistics for a player
    Stats {
        /// Chat user id of the player
        player: String,

        /// Also list this many of the most recent games
        #[arg(long, default_value = "0")]
        recent: i64,
    },
}
