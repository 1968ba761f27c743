//! crossync CLI
//!
//! Command-line tools for crossync record stores.
//!
//! # Commands
//!
//! - `ensure` - Register an entity
//! - `fetch` - Print an entity's stored record
//! - `submit` - Submit a new record version
//! - `inspect` - Display store statistics and contents
//! - `serve` - Run the sync service over a store

mod commands;
mod error;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// crossync command-line tools.
#[derive(Parser)]
#[command(name = "crossync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an entity, creating the store if needed
    Ensure {
        /// Entity id (UUID)
        id: String,
    },

    /// Print the stored record of an entity
    Fetch {
        /// Entity id (UUID)
        id: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Submit a new record version
    Submit {
        /// Entity id (UUID)
        id: String,

        /// New payload
        #[arg(long)]
        payload: String,

        /// Version the payload was computed from, or "none"
        #[arg(short, long, default_value = "none")]
        expected: String,
    },

    /// Display store statistics and contents
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run the sync service until interrupted
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Ensure { id } => {
            let path = cli.path.ok_or("Store path required for ensure")?;
            commands::ensure::run(&path, &id)?;
        }
        Commands::Fetch { id, format } => {
            let path = cli.path.ok_or("Store path required for fetch")?;
            commands::fetch::run(&path, &id, &format)?;
        }
        Commands::Submit {
            id,
            payload,
            expected,
        } => {
            let path = cli.path.ok_or("Store path required for submit")?;
            commands::submit::run(&path, &id, &payload, &expected)?;
        }
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Serve { bind } => {
            let path = cli.path.ok_or("Store path required for serve")?;
            commands::serve::run(&path, bind)?;
        }
        Commands::Version => {
            println!("crossync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("crossync Core v{}", crossync_core::VERSION);
        }
    }

    Ok(())
}
