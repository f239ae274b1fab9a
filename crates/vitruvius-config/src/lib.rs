//! Typed configuration for Vitruvius.
//!
//! This crate provides a strongly-typed configuration system with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use vitruvius_config::ConfigLoader;
//!
//! # fn main() -> Result<(), vitruvius_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("vitruvius.toml")?
//!     .with_env_prefix("VITRUVIUS")
//!     .with_dotenv()?
//!     .load()?;
//!
//! println!("default format: {}", config.views.default_format);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [views]
//! default_format = "html"
//! default_renderer = "json"
//!
//! [views.renderers]
//! json = "json_renderer"
//! txt = "text_renderer"
//!
//! [views.templates]
//! "404" = "errors/404"
//! "500" = "errors/500"
//!
//! [debug]
//! enabled = false
//!
//! [logging]
//! ignore_status = [404]
//!
//! [session]
//! cookie_name = "vitruvius_session"
//! timeout_secs = 3600
//!
//! [telemetry]
//! service_name = "vitruvius"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = false
//! ```

#![doc(html_root_url = "https://docs.rs/vitruvius-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{VitruviusConfig, VitruviusConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    DebugConfig, LogFormat, LogOutputConfig, LoggingConfig, MetricsConfig, SessionConfig,
    TelemetryConfigSection, ViewsConfig,
};
