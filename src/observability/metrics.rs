//! Metrics collection and exposition.
//!
//! # Metrics
//! - `capture_proxy_requests_total` (counter): requests by outcome, status
//! - `capture_proxy_request_duration_seconds` (histogram): latency by outcome
//! - `capture_proxy_store_failures_total` (counter): store failures by operation
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::observability::logging::{Outcome, StoreOp};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished exchange.
pub fn record_exchange(outcome: Outcome, status: u16, started: Instant) {
    counter!(
        "capture_proxy_requests_total",
        "outcome" => outcome.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "capture_proxy_request_duration_seconds",
        "outcome" => outcome.as_str()
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record a failed store operation.
pub fn record_store_failure(op: StoreOp) {
    counter!("capture_proxy_store_failures_total", "op" => op.as_str()).increment(1);
}
