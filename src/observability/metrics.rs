//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breaker_transitions_total` (counter): status changes by breaker, from, to
//! - `breaker_rejections_total` (counter): fast-failed calls by breaker
//! - `breaker_failures_total` (counter): failed protected calls by breaker
//! - `breaker_store_fallbacks_total` (counter): store errors by operation
//! - `breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! Recording is a no-op until a recorder is installed, so library users who
//! never call `init_metrics` pay nothing.

use std::net::SocketAddr;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::state::BreakerStatus;

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transition(breaker: &str, from: BreakerStatus, to: BreakerStatus) {
    metrics::counter!(
        "breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    record_state(breaker, to);
}

pub fn record_state(breaker: &str, status: BreakerStatus) {
    metrics::gauge!("breaker_state", "breaker" => breaker.to_string()).set(status.gauge_value());
}

pub fn record_rejection(breaker: &str) {
    metrics::counter!("breaker_rejections_total", "breaker" => breaker.to_string()).increment(1);
}

pub fn record_failure(breaker: &str) {
    metrics::counter!("breaker_failures_total", "breaker" => breaker.to_string()).increment(1);
}

pub fn record_store_fallback(operation: &'static str) {
    metrics::counter!("breaker_store_fallbacks_total", "operation" => operation).increment(1);
}
