//! Prometheus metrics for Vitruvius.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `vitruvius_requests_total` | Counter | `route`, `status` | Completed requests |
//! | `vitruvius_request_duration_seconds` | Histogram | `route` | Request latency |
//! | `vitruvius_stage_errors_total` | Counter | `stage` | Errors raised per lifecycle stage |
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].
//! The exporter runs in-process; expose [`render_metrics`] from whatever
//! transport serves the application.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Route label used when no route matched.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Metrics configuration.
#[derive(Debug, Clone, Default)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
}

/// Installs the Prometheus recorder.
///
/// Calling this again after a successful install is a no-op.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if another recorder is installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled || METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        "vitruvius_requests_total",
        "Total number of requests that completed the lifecycle"
    );
    describe_histogram!(
        "vitruvius_request_duration_seconds",
        "Request lifecycle duration in seconds"
    );
    describe_counter!(
        "vitruvius_stage_errors_total",
        "Errors raised by lifecycle stages"
    );
}

/// Records a completed request.
///
/// `route` is the matched route name, or [`UNMATCHED_ROUTE`].
pub fn record_request(route: &str, status_code: u16, duration: Duration) {
    counter!(
        "vitruvius_requests_total",
        "route" => route.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        "vitruvius_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records an error raised while running a lifecycle stage.
pub fn record_stage_error(stage: &str) {
    counter!(
        "vitruvius_stage_errors_total",
        "stage" => stage.to_string()
    )
    .increment(1);
}
