//! graphlog CLI
//!
//! Command-line tools for graphlog transaction logs and store directories.
//!
//! # Commands
//!
//! - `dump-log` - Print log entries for debugging
//! - `verify` - Check that a log decodes and is well sequenced
//! - `replay` - Replay a log into empty stores and report what it holds
//! - `backup` - Copy a store directory and write a checksum manifest

mod commands;
mod error;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// File name of the transaction log inside a store directory.
pub const LOG_FILE_NAME: &str = "graph.log";

/// graphlog command-line tools.
#[derive(Parser)]
#[command(name = "graphlog")]
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
    /// Print log entries for debugging
    DumpLog {
        /// Maximum number of entries to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Start from this offset (must be an entry boundary)
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check that the log decodes and every transaction is well sequenced
    Verify,

    /// Replay the log into empty in-memory stores
    Replay {
        /// Only apply transactions committed after this id
        #[arg(short, long, default_value = "0")]
        after_tx: u64,
    },

    /// Copy every store file into another directory
    Backup {
        /// Target directory
        destination: PathBuf,

        /// Include transaction logs in the copy
        #[arg(short, long)]
        forensics: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::DumpLog {
            limit,
            offset,
            format,
        } => {
            let path = cli.path.ok_or("Store path required for dump-log")?;
            commands::dump_log::run(&path.join(LOG_FILE_NAME), limit, offset, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Store path required for verify")?;
            commands::verify::run(&path.join(LOG_FILE_NAME))?;
        }
        Commands::Replay { after_tx } => {
            let path = cli.path.ok_or("Store path required for replay")?;
            commands::replay::run(&path.join(LOG_FILE_NAME), after_tx)?;
        }
        Commands::Backup {
            destination,
            forensics,
        } => {
            let path = cli.path.ok_or("Store path required for backup")?;
            commands::backup::run(&path, &destination, forensics)?;
        }
        Commands::Version => {
            println!("graphlog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("graphlog core v{}", graphlog_core::VERSION);
        }
    }

    Ok(())
}
