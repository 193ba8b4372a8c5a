//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by terminal gate state
//! - `gateway_rejections_total` (counter): rejections by category (header, query, body)
//! - `gateway_captured_body_bytes` (histogram): size of captured bodies
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no-ops until a recorder is installed
//! - Prometheus exporter is optional and owns its own listener

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a request by the state it ended in.
pub fn record_gate_outcome(state: &'static str) {
    counter!("gateway_requests_total", "state" => state).increment(1);
}

/// Count a rejection by stage.
pub fn record_rejection(category: &'static str) {
    counter!("gateway_rejections_total", "category" => category).increment(1);
}

/// Record the size of a captured body.
pub fn record_captured_body(bytes: usize) {
    histogram!("gateway_captured_body_bytes").record(bytes as f64);
}
