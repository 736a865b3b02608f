//! Prometheus metrics for maintenance gate decisions.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `maintenance_requests_total` - Requests seen by the gate (labels: gate, outcome)
//! - `maintenance_trigger_checks_total` - Trigger endpoint probes (labels: gate, result)
//! - `maintenance_upstream_errors_total` - Recovered trigger/source/file errors (labels: gate, kind)
//!
//! ## Histograms
//! - `maintenance_source_duration_seconds` - Time to produce the maintenance page (labels: gate, kind)
//!
//! Recording functions are no-ops until [`init_metrics`] installs an exporter,
//! so the library can be used without one.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "maintenance_requests_total";
    pub const TRIGGER_CHECKS_TOTAL: &str = "maintenance_trigger_checks_total";
    pub const UPSTREAM_ERRORS_TOTAL: &str = "maintenance_upstream_errors_total";
    pub const SOURCE_DURATION_SECONDS: &str = "maintenance_source_duration_seconds";
}

/// Initialize the Prometheus metrics exporter.
///
/// Starts the Prometheus HTTP listener on `metrics_addr` and registers
/// metric descriptions.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::REQUESTS_TOTAL,
        "Requests evaluated by the maintenance gate, by outcome"
    );
    describe_counter!(
        names::TRIGGER_CHECKS_TOTAL,
        "Trigger endpoint probes, by result"
    );
    describe_counter!(
        names::UPSTREAM_ERRORS_TOTAL,
        "Recovered errors while checking the trigger or producing the maintenance page"
    );
    describe_histogram!(
        names::SOURCE_DURATION_SECONDS,
        "Time spent producing the maintenance page in seconds"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record the final outcome of one gate evaluation.
pub fn record_request(gate: &str, outcome: &'static str) {
    counter!(names::REQUESTS_TOTAL, "gate" => gate.to_string(), "outcome" => outcome)
        .increment(1);
}

/// Record a trigger probe result.
pub fn record_trigger_check(gate: &str, live: bool) {
    let result = if live { "live" } else { "not_live" };
    counter!(names::TRIGGER_CHECKS_TOTAL, "gate" => gate.to_string(), "result" => result)
        .increment(1);
}

/// Record a recovered error.
pub fn record_upstream_error(gate: &str, kind: &'static str) {
    counter!(names::UPSTREAM_ERRORS_TOTAL, "gate" => gate.to_string(), "kind" => kind)
        .increment(1);
}

/// Record how long producing the maintenance page took.
pub fn record_source_duration(gate: &str, kind: &'static str, duration_secs: f64) {
    histogram!(names::SOURCE_DURATION_SECONDS, "gate" => gate.to_string(), "kind" => kind)
        .record(duration_secs);
}
