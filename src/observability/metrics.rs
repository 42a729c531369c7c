//! Metrics collection and exposition.
//!
//! # Metrics
//! - `znode_http_requests_total` (counter): requests by method, route, status
//! - `znode_http_request_duration_seconds` (histogram): request latency
//! - `znode_operations_total` (counter): gateway operations by op, outcome
//! - `znode_operation_duration_seconds` (histogram): gateway latency
//! - `zookeeper_connected` (gauge): 1=connected, 0=not connected
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "znode_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "znode_http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_operation(op: &'static str, outcome: &'static str, start: Instant) {
    counter!("znode_operations_total", "op" => op, "outcome" => outcome).increment(1);
    histogram!("znode_operation_duration_seconds", "op" => op)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_connection_state(connected: bool) {
    gauge!("zookeeper_connected").set(if connected { 1.0 } else { 0.0 });
}
