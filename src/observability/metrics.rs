//! Metrics collection and exposition.
//!
//! # Metrics
//! - `path_proxy_requests_total` (counter): requests by mount mode and gate outcome
//! - `path_proxy_upstream_duration_seconds` (histogram): time to upstream response head

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::routing::TargetMode;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one request outcome (`redirect`, `unauthorized`, `auth_failed`, `proxied`, `upstream_error`).
pub fn record_outcome(mode: TargetMode, outcome: &'static str) {
    let mode = match mode {
        TargetMode::Rewrite => "rewrite",
        TargetMode::Passthrough => "passthrough",
    };
    counter!("path_proxy_requests_total", "mode" => mode, "outcome" => outcome).increment(1);
}

/// Record how long the backend took to answer. `kind` is `http` or `websocket`.
pub fn record_upstream(kind: &'static str, start: Instant) {
    histogram!("path_proxy_upstream_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}
