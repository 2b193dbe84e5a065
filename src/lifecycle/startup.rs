//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize subsystems in dependency order
//! - Start background tasks (config watcher, metrics)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener starts last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::{load_config, ConfigError, ConfigWatcher, EdgeConfig};
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::observability::metrics;

/// Error bringing the service up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),

    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}

/// Load the config file, or fall back to defaults when no path is given.
pub fn load_startup_config(path: Option<&Path>) -> Result<EdgeConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(EdgeConfig::default()),
    }
}

/// Run the edge service until a stop signal arrives.
///
/// `config_path`, when given, is watched for redirect table changes.
pub async fn run(config: EdgeConfig, config_path: Option<&Path>) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %config.origin.url,
        rules = config.redirects.rules.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(ServerError::from)?;
        metrics::init_metrics(addr)?;
    }

    // Watcher must outlive the server.
    let (_watcher, config_updates) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    spawn_signal_handler(shutdown);

    match tls {
        Some(tls) => server.run_tls(&tls, config_updates, server_shutdown).await?,
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, config_updates, server_shutdown).await?;
        }
    }

    Ok(())
}
