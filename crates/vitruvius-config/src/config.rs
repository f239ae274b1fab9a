//! Main configuration types.
//!
//! This module provides the top-level [`VitruviusConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, DebugConfig, LogFormat, LoggingConfig, SessionConfig, TelemetryConfigSection,
    ViewsConfig,
};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Complete Vitruvius application configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use vitruvius_config::VitruviusConfig;
///
/// let config = VitruviusConfig::default();
/// assert_eq!(config.views.default_format, "html");
/// assert!(!config.debug.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct VitruviusConfig {
    /// Views and rendering.
    #[serde(default)]
    pub views: ViewsConfig,

    /// Debug switches.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Exception logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session cookie.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging output and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl VitruviusConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use vitruvius_config::{DebugConfig, VitruviusConfig};
    ///
    /// let config = VitruviusConfig::builder()
    ///     .debug(DebugConfig { enabled: true })
    ///     .build();
    ///
    /// assert!(config.debug.enabled);
    /// ```
    #[must_use]
    pub fn builder() -> VitruviusConfigBuilder {
        VitruviusConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `views.default_renderer` is not a key of `views.renderers`
    /// - `views.templates` has no `"500"` entry
    /// - `telemetry.logging.level` names an unknown level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.views.renderers.contains_key(&self.views.default_renderer) {
            return Err(ConfigError::invalid_value(
                "views.default_renderer",
                format!("no renderer configured for '{}'", self.views.default_renderer),
            ));
        }

        if !self.views.templates.contains_key("500") {
            return Err(ConfigError::validation_error(
                "views.templates must define a \"500\" error template",
            ));
        }

        for directive in self.telemetry.logging.level.split(',') {
            let level = directive.rsplit('=').next().unwrap_or(directive).trim();
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(ConfigError::invalid_value(
                    "telemetry.logging.level",
                    format!("unknown log level: {level}"),
                ));
            }
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Debug reports are enabled and logs are pretty-printed at debug level.
    ///
    /// # Example
    ///
    /// ```
    /// use vitruvius_config::VitruviusConfig;
    ///
    /// let config = VitruviusConfig::development();
    /// assert!(config.debug.enabled);
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.debug.enabled = true;
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// Debug reports are off, logs are JSON, metrics and secure cookies are on.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.debug.enabled = false;
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.metrics.enabled = true;
        config.session.secure = true;

        config
    }
}

/// Builder for [`VitruviusConfig`].
#[derive(Debug, Default)]
pub struct VitruviusConfigBuilder {
    views: Option<ViewsConfig>,
    debug: Option<DebugConfig>,
    logging: Option<LoggingConfig>,
    session: Option<SessionConfig>,
    telemetry: Option<TelemetryConfigSection>,
}

impl VitruviusConfigBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the views section.
    #[must_use]
    pub fn views(mut self, views: ViewsConfig) -> Self {
        self.views = Some(views);
        self
    }

    /// Set the debug section.
    #[must_use]
    pub fn debug(mut self, debug: DebugConfig) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Set the exception logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the session section.
    #[must_use]
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> VitruviusConfig {
        VitruviusConfig {
            views: self.views.unwrap_or_default(),
            debug: self.debug.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            session: self.session.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<VitruviusConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = VitruviusConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.ignore_status, vec![404]);
        assert_eq!(config.session.timeout_secs, 3600);
    }

    #[test]
    fn test_validate_unknown_default_renderer() {
        let mut config = VitruviusConfig::default();
        config.views.default_renderer = "xml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("views.default_renderer"));
    }

    #[test]
    fn test_validate_missing_500_template() {
        let mut config = VitruviusConfig::default();
        config.views.templates.shift_remove("500");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_log_level_directives() {
        let mut config = VitruviusConfig::default();
        config.telemetry.logging.level = "info,vitruvius_lifecycle=trace".to_string();
        assert!(config.validate().is_ok());

        config.telemetry.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets() {
        let dev = VitruviusConfig::development();
        assert!(dev.debug.enabled);
        assert_eq!(dev.telemetry.logging.format, LogFormat::Pretty);

        let prod = VitruviusConfig::production();
        assert!(!prod.debug.enabled);
        assert!(prod.telemetry.metrics.enabled);
        assert!(prod.session.secure);
    }

    #[test]
    fn test_build_validated_failure() {
        let views = ViewsConfig {
            default_renderer: "missing".to_string(),
            ..ViewsConfig::default()
        };
        assert!(VitruviusConfig::builder().views(views).build_validated().is_err());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            [views]
            default_format = "json"

            [views.templates]
            "500" = "oops"
            "home/index" = "landing"

            [debug]
            enabled = true
        "#;

        let config: VitruviusConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.views.default_format, "json");
        assert_eq!(config.views.template("home/index"), Some("landing"));
        assert_eq!(config.views.template("500"), Some("oops"));
        assert!(config.debug.enabled);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml_str = r#"
            [views]
            default_format = "json"
            layout = "main"
        "#;

        let result: Result<VitruviusConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }
}
