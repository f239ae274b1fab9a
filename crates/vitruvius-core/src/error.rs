//! Classified lifecycle errors.
//!
//! This module provides the [`AppError`] type raised by every lifecycle
//! stage. Each variant maps to an [`ErrorKind`] and an HTTP status code.
//!
//! | Kind | Status | Raised by |
//! |---|---|---|
//! | `NotFound` | 404 | route matching |
//! | `InternalDispatch` | 500 | handler resolution or execution |
//! | `RenderFailure` | 500 | rendering |
//! | `Application` | carried | handlers, intentionally |
//!
//! Errors that are not already an `AppError` are wrapped as
//! `InternalDispatch` with the original kept as `source`, see
//! [`AppError::classify`].

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vitruvius_router::RouteError;

use crate::container::ContainerError;

/// Result type alias using [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// Classification of lifecycle errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No route matched the request.
    NotFound,
    /// Handler resolution or invocation failed.
    InternalDispatch,
    /// The renderer could not produce output.
    RenderFailure,
    /// Intentionally raised by a handler with its own status.
    Application,
}

impl ErrorKind {
    /// Returns the default HTTP status code for this kind.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalDispatch | Self::RenderFailure | Self::Application => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable snake_case code used in error reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InternalDispatch => "internal_dispatch",
            Self::RenderFailure => "render_failure",
            Self::Application => "application",
        }
    }
}

/// Standard lifecycle error for Vitruvius.
///
/// # Example
///
/// ```
/// use vitruvius_core::{AppError, ErrorKind};
/// use http::StatusCode;
///
/// let err = AppError::application("Invalid input", StatusCode::BAD_REQUEST);
/// assert_eq!(err.kind(), ErrorKind::Application);
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// No route matched.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Handler resolution or execution failed.
    #[error("Internal error: {message}")]
    InternalDispatch {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Rendering failed.
    #[error("Render error: {message}")]
    RenderFailure {
        /// Human-readable error message.
        message: String,
        /// The underlying renderer error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A handler-raised error with an explicit status.
    #[error("{message}")]
    Application {
        /// Human-readable error message.
        message: String,
        /// Status code to respond with.
        status: StatusCode,
        /// Optional underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl AppError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates an internal dispatch error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalDispatch {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal dispatch error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::InternalDispatch {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a render failure.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::RenderFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a render failure with a source error.
    pub fn render_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::RenderFailure {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an application error with its own status.
    #[must_use]
    pub fn application(message: impl Into<String>, status: StatusCode) -> Self {
        Self::Application {
            message: message.into(),
            status,
            source: None,
        }
    }

    /// Classifies an arbitrary handler error.
    ///
    /// An `AppError` inside `err` is returned unchanged; anything else is
    /// wrapped as [`ErrorKind::InternalDispatch`] with `message`.
    pub fn classify(err: anyhow::Error, message: impl Into<String>) -> Self {
        match err.downcast::<Self>() {
            Ok(classified) => classified,
            Err(other) => Self::internal_with_source(message, other),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InternalDispatch { .. } => ErrorKind::InternalDispatch,
            Self::RenderFailure { .. } => ErrorKind::RenderFailure,
            Self::Application { .. } => ErrorKind::Application,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Application { status, .. } => *status,
            other => other.kind().default_status_code(),
        }
    }

    /// Returns the bare message without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::InternalDispatch { message, .. }
            | Self::RenderFailure { message, .. }
            | Self::Application { message, .. } => message,
        }
    }

    /// Display text of the direct cause, if any.
    #[must_use]
    pub fn cause_message(&self) -> Option<String> {
        std::error::Error::source(self).map(ToString::to_string)
    }

    /// This error followed by every error in its source chain.
    #[must_use]
    pub fn cause_chain(&self) -> Vec<String> {
        let mut frames = vec![self.to_string()];
        let mut current = std::error::Error::source(self);
        while let Some(err) = current {
            frames.push(err.to_string());
            current = err.source();
        }
        frames
    }

    /// Builds the serializable report rendered for this error.
    ///
    /// Without `debug` only the status, its canonical reason and the kind
    /// are exposed.
    #[must_use]
    pub fn report(&self, debug: bool, version: &str) -> ErrorReport {
        let status = self.status_code();
        if debug {
            ErrorReport {
                code: status.as_u16(),
                message: self.message().to_string(),
                cause_message: self.cause_message(),
                kind: self.kind().as_str().to_string(),
                frames: self.cause_chain(),
                version: version.to_string(),
                debug,
            }
        } else {
            ErrorReport {
                code: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Error").to_string(),
                cause_message: None,
                kind: self.kind().as_str().to_string(),
                frames: Vec::new(),
                version: version.to_string(),
                debug,
            }
        }
    }
}

impl From<RouteError> for AppError {
    fn from(err: RouteError) -> Self {
        Self::internal_with_source("Route assembly failed", err)
    }
}

impl From<ContainerError> for AppError {
    fn from(err: ContainerError) -> Self {
        Self::internal_with_source("Service lookup failed", err)
    }
}

/// Error payload handed to the renderer by the exception stage.
///
/// # JSON Format
///
/// ```json
/// {
///   "code": 500,
///   "message": "An error occurred executing controller: home",
///   "cause_message": "database unavailable",
///   "type": "internal_dispatch",
///   "frames": ["Internal error: ...", "database unavailable"],
///   "version": "0.1.0",
///   "debug": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// HTTP status code.
    pub code: u16,
    /// Error message (canonical reason when debug is off).
    pub message: String,
    /// Message of the direct cause.
    pub cause_message: Option<String>,
    /// Error kind code.
    #[serde(rename = "type")]
    pub kind: String,
    /// Diagnostic frames: the error and its cause chain.
    pub frames: Vec<String>,
    /// Framework version.
    pub version: String,
    /// Whether debug details are included.
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("database unavailable")]
    struct DbError;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::render("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::application("x", StatusCode::BAD_REQUEST).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_classify_wraps_unclassified() {
        let err = AppError::classify(anyhow::Error::new(DbError), "handler failed");
        assert_eq!(err.kind(), ErrorKind::InternalDispatch);
        assert_eq!(err.message(), "handler failed");
        assert_eq!(err.cause_message().as_deref(), Some("database unavailable"));
    }

    #[test]
    fn test_classify_passes_through_classified() {
        let original = AppError::application("Invalid", StatusCode::UNPROCESSABLE_ENTITY);
        let err = AppError::classify(anyhow::Error::new(original), "ignored");
        assert_eq!(err.kind(), ErrorKind::Application);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message(), "Invalid");
    }

    #[test]
    fn test_cause_chain() {
        let err = AppError::internal_with_source("outer", DbError);
        assert_eq!(
            err.cause_chain(),
            vec!["Internal error: outer".to_string(), "database unavailable".to_string()]
        );
    }

    #[test]
    fn test_report_debug() {
        let err = AppError::internal_with_source("outer", DbError);
        let report = err.report(true, "1.0.0");
        assert_eq!(report.code, 500);
        assert_eq!(report.message, "outer");
        assert_eq!(report.kind, "internal_dispatch");
        assert_eq!(report.frames.len(), 2);
        assert!(report.debug);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["type"], "internal_dispatch");
    }

    #[test]
    fn test_report_without_debug_is_generic() {
        let err = AppError::internal_with_source("secret detail", DbError);
        let report = err.report(false, "1.0.0");
        assert_eq!(report.message, "Internal Server Error");
        assert!(report.cause_message.is_none());
        assert!(report.frames.is_empty());
    }

    #[test]
    fn test_from_route_error() {
        let err: AppError = RouteError::route_not_found("nope").into();
        assert_eq!(err.kind(), ErrorKind::InternalDispatch);
        assert!(err.cause_message().unwrap().contains("nope"));
    }
}
