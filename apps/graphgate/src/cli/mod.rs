//! # Graph Manager CLI Module
//!
//! ## Available Commands
//!
//! - `health` - Ping the graph store
//! - `list` - List named graphs with their triple counts
//! - `stats` - Show dataset statistics
//! - `retrieve` - Print one named graph
//! - `drop` - Drop one named graph
//! - `execute` - Run one operation request from a file
//! - `rpc` - Consume operation requests from the broker

mod commands;

use clap::{Parser, Subcommand};
use graphgate::config::GatewayConfig;
use graphgate_core::GatewayError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Graph Manager gateway
///
/// Graph-store operations over SPARQL 1.1 with provenance records.
#[derive(Parser, Debug)]
#[command(name = "graphgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the graph store answers
    Health,

    /// List named graphs
    List,

    /// Show dataset statistics
    Stats,

    /// Print the contents of a named graph
    Retrieve {
        /// Named graph URI
        #[arg(short, long)]
        uri: String,
    },

    /// Drop a named graph
    Drop {
        /// Named graph URI
        #[arg(short, long)]
        uri: String,
    },

    /// Run one operation request and print the response envelope
    Execute {
        /// Path to the request JSON
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Answer operation requests from the RPC queue until Ctrl-C
    Rpc,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), GatewayError> {
    let config = GatewayConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Health) => cmd_health(&config, json_mode).await,
        Some(Commands::List) => cmd_list(&config, json_mode).await,
        Some(Commands::Stats) => cmd_stats(&config, json_mode).await,
        Some(Commands::Retrieve { uri }) => cmd_retrieve(&config, &uri).await,
        Some(Commands::Drop { uri }) => cmd_drop(&config, json_mode, &uri).await,
        Some(Commands::Execute { file }) => cmd_execute(&config, &file).await,
        Some(Commands::Rpc) => cmd_rpc(&config).await,
        None => {
            // No subcommand - health check by default
            cmd_health(&config, json_mode).await
        }
    }
}
