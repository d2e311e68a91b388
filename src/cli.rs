//! CLI definitions for wsdom.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// wsdom CLI.
#[derive(Parser)]
#[command(name = "wsdom")]
#[command(about = "Headless authoritative DOM mirrored to clients over WebSocket")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/wsdom.toml", global = true, env = "WSDOM_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the WebSocket server in foreground (default)
    Serve {
        /// Server host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Connect a headless mirror client and print the mirrored body
    Mirror {
        /// Server WebSocket URL
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
        url: String,

        /// Print the body after every batch, not only when it changes
        #[arg(long)]
        print_every_batch: bool,
    },

    /// Load and validate the configuration
    CheckConfig,
}
