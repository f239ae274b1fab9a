//! Configuration schema types.
//!
//! This module defines the structure of every configuration section.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use vitruvius_core::SessionSettings;

/// View and rendering configuration.
///
/// `renderers` maps a format token to the container service name of the
/// renderer for it. `default_renderer` is a key of that table, used when a
/// format has no renderer of its own. `templates` overrides derived template
/// paths and names the error template per status code.
///
/// # Example
///
/// ```
/// use vitruvius_config::ViewsConfig;
///
/// let views = ViewsConfig::default();
/// assert_eq!(views.default_format, "html");
/// assert_eq!(views.renderers["json"], "json_renderer");
/// assert_eq!(views.templates["500"], "errors/500");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ViewsConfig {
    /// Format used when the route carries none.
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Renderer table key used as a fallback.
    #[serde(default = "default_renderer")]
    pub default_renderer: String,

    /// Format token to renderer service name.
    #[serde(default = "default_renderers")]
    pub renderers: IndexMap<String, String>,

    /// Template overrides and error templates.
    #[serde(default = "default_templates")]
    pub templates: IndexMap<String, String>,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            default_renderer: default_renderer(),
            renderers: default_renderers(),
            templates: default_templates(),
        }
    }
}

impl ViewsConfig {
    /// Service name of the renderer for a format, if one is configured.
    #[must_use]
    pub fn renderer_for(&self, format: &str) -> Option<&str> {
        self.renderers.get(format).map(String::as_str)
    }

    /// Template override for a key (derived path or status code).
    #[must_use]
    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }
}

fn default_format() -> String {
    "html".to_string()
}

fn default_renderer() -> String {
    "json".to_string()
}

fn default_renderers() -> IndexMap<String, String> {
    IndexMap::from([
        ("json".to_string(), "json_renderer".to_string()),
        ("txt".to_string(), "text_renderer".to_string()),
    ])
}

fn default_templates() -> IndexMap<String, String> {
    IndexMap::from([
        ("404".to_string(), "errors/404".to_string()),
        ("500".to_string(), "errors/500".to_string()),
    ])
}

/// Debug configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Expose error details (cause and frames) in error reports.
    #[serde(default)]
    pub enabled: bool,
}

/// Exception logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Status codes logged at debug level instead of error.
    #[serde(default = "default_ignore_status")]
    pub ignore_status: Vec<u16>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            ignore_status: default_ignore_status(),
        }
    }
}

fn default_ignore_status() -> Vec<u16> {
    vec![404]
}

/// Session cookie configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the session id cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Cookie lifetime in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Mark the cookie `Secure`.
    #[serde(default)]
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            timeout_secs: default_timeout_secs(),
            secure: false,
        }
    }
}

impl SessionConfig {
    /// Converts into the settings used by the request context.
    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            cookie_name: self.cookie_name.clone(),
            timeout_secs: self.timeout_secs,
            secure: self.secure,
            http_only: true,
        }
    }
}

fn default_cookie_name() -> String {
    "vitruvius_session".to_string()
}

fn default_timeout_secs() -> u64 {
    3600
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogOutputConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g. `info` or `info,vitruvius=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LogOutputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder.
    #[serde(default)]
    pub enabled: bool,
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name attached to logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogOutputConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logging: LogOutputConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

fn default_service_name() -> String {
    "vitruvius".to_string()
}

fn default_true() -> bool {
    true
}
