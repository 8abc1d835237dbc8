//! Metrics collection and exposition.
//!
//! # Metrics
//! - `actions_invocations_total` (counter): invocations by status and error kind
//! - `actions_invocation_duration_seconds` (histogram): end-to-end latency
//! - `actions_wallet_resolutions_total` (counter): cache hits, creations, failures
//! - `actions_gas_estimate_fallbacks_total` (counter): estimates replaced by the default
//! - `actions_cache_entries` (gauge): entries in the keyed cache
//!
//! Without an installed recorder every call here is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_invocation(status: &'static str, kind: &'static str, started: Instant) {
    metrics::counter!("actions_invocations_total", "status" => status, "kind" => kind)
        .increment(1);
    metrics::histogram!("actions_invocation_duration_seconds", "status" => status)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_wallet_resolution(outcome: &'static str) {
    metrics::counter!("actions_wallet_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_gas_fallback(chain_id: u64) {
    metrics::counter!("actions_gas_estimate_fallbacks_total", "chain_id" => chain_id.to_string())
        .increment(1);
}

pub fn record_cache_size(size: usize) {
    metrics::gauge!("actions_cache_entries").set(size as f64);
}
