//! # Graph Manager Gateway
//!
//! The main binary of the Graph Manager gateway.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  apps/graphgate (THE BINARY)                 │
//! │                                                              │
//! │  ┌───────────┐   ┌──────────────┐   ┌─────────────────────┐  │
//! │  │   CLI     │   │  RPC server  │   │ Provenance publisher│  │
//! │  │  (clap)   │   │ (broker API) │   │    (broker API)     │  │
//! │  └─────┬─────┘   └──────┬───────┘   └──────────┬──────────┘  │
//! │        └────────────────┼──────────────────────┘             │
//! │                         ▼                                    │
//! │        ┌──────────────────────────────┐                      │
//! │        │ Pipeline + GraphStoreClient  │ ──► SPARQL 1.1 store │
//! │        └──────────────┬───────────────┘                      │
//! │                       ▼                                      │
//! │              ┌────────────────┐                              │
//! │              │ graphgate-core │                              │
//! │              │  (THE LOGIC)   │                              │
//! │              └────────────────┘                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! graphgate list
//! graphgate retrieve --uri http://example.org/g1
//! graphgate execute --file request.json
//! graphgate --config gateway.toml rpc
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // GRAPHGATE_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("GRAPHGATE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "graphgate=info".into());

    // Logs go to stderr; stdout carries command output.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    eprintln!(
        r#"
  Graph Manager gateway v{}
  SPARQL 1.1 graph store operations with provenance
"#,
        env!("CARGO_PKG_VERSION")
    );
}
