//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the edge handler
//! - Wire up middleware (tracing, limits, request ID, timeout)
//! - Bind server to a plain or TLS listener
//! - Evaluate the redirect decision for every request
//! - Forward passthrough requests to the origin
//! - Swap in reloaded redirect tables
//! - Observability (metrics, correlation IDs)

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use arc_swap::ArcSwap;
use std::net::{AddrParseError, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{EdgeConfig, TlsConfig};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::response::redirect_response;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::origin::{Origin, OriginError};
use crate::redirect::{Action, RedirectTable, TableError};

/// Time in-flight requests get to finish after shutdown on the TLS listener.
const TLS_DRAIN_SECS: u64 = 10;

/// Error starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid redirect table: {0}")]
    Table(#[from] TableError),

    #[error(transparent)]
    Origin(#[from] OriginError),

    #[error("invalid bind address: {0}")]
    Address(#[from] AddrParseError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<ArcSwap<RedirectTable>>,
    pub origin: Arc<Origin>,
    pub in_flight: Arc<Semaphore>,
}

/// HTTP server for the edge service.
pub struct HttpServer {
    router: Router,
    config: EdgeConfig,
    table: Arc<ArcSwap<RedirectTable>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: EdgeConfig) -> Result<Self, ServerError> {
        let table = Arc::new(ArcSwap::from_pointee(config.redirects.build_table()?));
        let origin = Origin::from_config(&config.origin, Duration::from_secs(config.timeouts.origin_secs))?;

        let state = AppState {
            table: table.clone(),
            origin: Arc::new(origin),
            in_flight: Arc::new(Semaphore::new(config.listener.max_connections)),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            table,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .fallback(edge_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::GATEWAY_TIMEOUT,
                        Duration::from_secs(config.timeouts.request_secs),
                    )),
            )
    }

    /// Run the server on a plain TCP listener until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<EdgeConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(apply_config_updates(self.table.clone(), config_updates));

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server behind TLS until `shutdown` fires.
    pub async fn run_tls(
        self,
        tls: &TlsConfig,
        config_updates: mpsc::UnboundedReceiver<EdgeConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr: SocketAddr = self.config.listener.bind_address.parse()?;
        let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
        tracing::info!(address = %addr, "HTTPS server starting");

        tokio::spawn(apply_config_updates(self.table.clone(), config_updates));

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Live redirect table shared with the handler.
    pub fn table(&self) -> Arc<ArcSwap<RedirectTable>> {
        self.table.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

/// Replace the redirect table whenever a new configuration arrives.
///
/// A table that fails to build is dropped and the current one kept.
async fn apply_config_updates(
    table: Arc<ArcSwap<RedirectTable>>,
    mut updates: mpsc::UnboundedReceiver<EdgeConfig>,
) {
    while let Some(config) = updates.recv().await {
        match config.redirects.build_table() {
            Ok(new_table) => {
                tracing::info!(
                    rules = new_table.rules().len(),
                    passthrough = new_table.passthrough_paths().len(),
                    "Redirect table reloaded"
                );
                table.store(Arc::new(new_table));
                metrics::record_config_reload(true);
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected reloaded redirect table, keeping current one");
                metrics::record_config_reload(false);
            }
        }
    }
}

/// Main edge handler.
/// Decides redirect vs passthrough and forwards passthrough to the origin.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();
    let method = request.method().clone();

    let action = state.table.load().decide(request.uri().path());
    metrics::record_decision(action.label());

    let response = match action {
        Action::Redirect(redirect) => {
            tracing::debug!(
                request_id = %request_id,
                path = %request.uri().path(),
                location = %redirect.location,
                "Redirecting"
            );
            redirect_response(&redirect)
        }
        Action::Passthrough => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %request.uri().path(),
                "Passing through to origin"
            );
            // Only origin fetches count against the in-flight limit.
            let Ok(_permit) = state.in_flight.clone().try_acquire_owned() else {
                tracing::warn!(request_id = %request_id, "In-flight limit reached");
                metrics::record_request(method.as_str(), 503, start_time);
                return (StatusCode::SERVICE_UNAVAILABLE, "Too many requests in flight").into_response();
            };
            match state.origin.forward(request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(request_id = %request_id, error = %e, "Origin error");
                    metrics::record_origin_error(e.kind());
                    e.into_response()
                }
            }
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}
