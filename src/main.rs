//! Edge redirect service.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 EDGE SERVICE                 │
//!     Client Request   │  ┌────────┐    ┌──────────┐    ┌──────────┐  │
//!     ─────────────────┼─▶│  http  │───▶│ redirect │───▶│  origin  │──┼──▶ Origin
//!                      │  │ server │    │  table   │    │ forward  │  │
//!                      │  └────────┘    └────┬─────┘    └──────────┘  │
//!     301 + Location   │                     │                        │
//!     ◀────────────────┼─────────────────────┘                        │
//!                      │                                              │
//!                      │  config (TOML, hot reload) · observability   │
//!                      │  lifecycle (signals, graceful shutdown)      │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_redirect::config::ObservabilityConfig;
use edge_redirect::lifecycle::startup::{self, load_startup_config};
use edge_redirect::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "edge-redirect")]
#[command(about = "Edge service that redirects or passes requests through to an origin", long_about = None)]
struct Args {
    /// TOML configuration file. Watched for redirect rule changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_startup_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, path = ?args.config, "Failed to load configuration");
            return Err(e.into());
        }
    };

    init_logging(&config.observability);
    tracing::info!("edge-redirect v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config, args.config.as_deref()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
