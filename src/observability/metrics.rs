//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_decisions_total` (counter): redirect decisions by action
//! - `edge_requests_total` (counter): requests by method, status
//! - `edge_request_duration_seconds` (histogram): latency distribution
//! - `edge_origin_errors_total` (counter): failed origin fetches by kind
//! - `edge_config_reloads_total` (counter): hot reloads by outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exporter runs its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and start its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_decision(action: &'static str) {
    metrics::counter!("edge_decisions_total", "action" => action).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "edge_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("edge_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_origin_error(kind: &'static str) {
    metrics::counter!("edge_origin_errors_total", "kind" => kind).increment(1);
}

pub fn record_config_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("edge_config_reloads_total", "outcome" => outcome).increment(1);
}
