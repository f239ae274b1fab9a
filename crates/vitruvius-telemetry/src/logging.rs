//! Structured logging.
//!
//! Every request runs inside a `request` span carrying `request_id`, `method`
//! and `path`; listeners log with `stage`, `route` and `status` fields. This
//! module installs the subscriber that turns those into output.
//!
//! # Example
//!
//! ```rust,ignore
//! use vitruvius_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(route = "home", "dispatching");
//! ```

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Install a subscriber at all.
    pub enabled: bool,

    /// `EnvFilter` directive, e.g. `info,vitruvius_router=trace`.
    pub level: String,

    /// JSON lines instead of pretty multi-line output.
    pub json_format: bool,

    /// Emit an event when each request span closes, with its busy/idle time.
    pub lifecycle_spans: bool,

    /// Include source file and line.
    pub file_line_info: bool,

    /// Logged once at startup.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            lifecycle_spans: false,
            file_line_info: false,
            service_name: "vitruvius".to_string(),
        }
    }
}

impl LogConfig {
    /// Pretty output at debug level, with request timings and source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            lifecycle_spans: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// JSON lines at info level.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

/// Installs the global subscriber described by `config`.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter directive is invalid
/// or a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    tracing_subscriber::registry()
        .with(fmt_layer(config).with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(service = %config.service_name, json = config.json_format, "logging initialized");
    Ok(())
}

/// Parses a filter directive.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` naming the bad directive.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| TelemetryError::LoggingInit(format!("invalid log filter '{directive}': {e}")))
}

fn fmt_layer(config: &LogConfig) -> BoxedLayer {
    let span_events = if config.lifecycle_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info);

    if config.json_format {
        layer.json().with_current_span(true).boxed()
    } else {
        layer.pretty().boxed()
    }
}
