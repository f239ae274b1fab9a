//! Observability for Vitruvius.
//!
//! - **Logging**: structured JSON or pretty logs via `tracing-subscriber`
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Example
//!
//! ```rust,ignore
//! use vitruvius_telemetry::{init_telemetry, LogConfig, MetricsConfig, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig {
//!     service_name: "blog".to_string(),
//!     logging: LogConfig::production(),
//!     metrics: MetricsConfig { enabled: true },
//! })?;
//! ```
//!
//! # Metrics Output
//!
//! ```text
//! # HELP vitruvius_requests_total Total number of requests that completed the lifecycle
//! # TYPE vitruvius_requests_total counter
//! vitruvius_requests_total{route="home",status="200"} 1234
//! vitruvius_requests_total{route="unmatched",status="404"} 56
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use crate::metrics::{
    init_metrics, record_request, record_stage_error, render_metrics, MetricsConfig,
    UNMATCHED_ROUTE,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Configuration for all telemetry subsystems.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to logs.
    pub service_name: String,

    /// Logging configuration.
    pub logging: LogConfig,

    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "vitruvius".to_string(),
            logging: LogConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    let mut logging = config.logging.clone();
    logging.service_name.clone_from(&config.service_name);
    init_logging(&logging)?;

    init_metrics(&config.metrics)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "vitruvius");
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_init_with_everything_disabled() {
        let config = TelemetryConfig {
            logging: LogConfig {
                enabled: false,
                ..LogConfig::default()
            },
            ..TelemetryConfig::default()
        };
        assert!(init_telemetry(&config).is_ok());
    }
}
