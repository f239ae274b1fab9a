//! Errors raised while loading or validating a [`VitruviusConfig`](crate::VitruviusConfig).

use std::path::PathBuf;
use thiserror::Error;

/// A configuration source could not be loaded, or the merged result is
/// unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// A configuration file exists but could not be read.
    #[error("cannot read configuration file {path}")]
    Read {
        /// The file being read.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A source is neither TOML nor JSON.
    #[error("unsupported configuration format '{format}' (expected toml or json)")]
    UnsupportedFormat {
        /// The format name or file extension that was given.
        format: String,
    },

    /// Malformed TOML.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment override names an unknown key or carries a bad value.
    #[error("environment override {var}: {reason}")]
    EnvOverride {
        /// The environment variable.
        var: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A single setting has a value the lifecycle cannot use.
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted path of the setting, e.g. `views.default_renderer`.
        field: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The settings are individually fine but inconsistent as a whole.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl ConfigError {
    /// A missing file at `path`.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// An unreadable file at `path`.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// A source in a format other than TOML or JSON.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// A bad value for the setting at `field`.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// A bad environment override.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// An inconsistent configuration.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
