//! Metrics collection and exposition.
//!
//! # Metrics
//! - `harness_transactions_total` (counter): transactions by method and outcome
//!   (submitted, confirmed, reverted, timeout, rejected)
//! - `harness_confirmation_seconds` (histogram): submission-to-receipt latency
//! - `harness_stages_total` (counter): stage outcomes by stage and status
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing when the exporter is disabled.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with a scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a transaction lifecycle event.
pub fn record_transaction(method: &'static str, outcome: &'static str) {
    metrics::counter!("harness_transactions_total", "method" => method, "outcome" => outcome)
        .increment(1);
}

/// Record time from submission to receipt.
pub fn record_confirmation_latency(method: &'static str, elapsed: Duration) {
    metrics::histogram!("harness_confirmation_seconds", "method" => method)
        .record(elapsed.as_secs_f64());
}

/// Count a workflow stage outcome.
pub fn record_stage(stage: &'static str, status: &'static str) {
    metrics::counter!("harness_stages_total", "stage" => stage, "status" => status).increment(1);
}
