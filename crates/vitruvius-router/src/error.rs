//! Router error types.

use thiserror::Error;

/// Result type alias using [`RouteError`].
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors raised while building routes or assembling paths.
///
/// "No match" is never an error: matching returns `Option`. These variants
/// cover construction-time failures and reverse assembly only.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The segment path has an unbalanced `[` or `]`.
    #[error("Bracket mismatch detected in path '{path}'")]
    BracketMismatch {
        /// The offending path.
        path: String,
    },

    /// The generated (or explicitly supplied) pattern is not a valid regex.
    #[error("Invalid pattern for route '{route}': {source}")]
    InvalidPattern {
        /// Route name.
        route: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// An entry in `accepts` is not a valid HTTP method token.
    #[error("Invalid HTTP method '{method}' for route '{route}'")]
    InvalidMethod {
        /// Route name.
        route: String,
        /// The rejected method string.
        method: String,
    },

    /// A placeholder outside any optional group had no value during assembly.
    #[error("Missing {param} in params for route '{route}'")]
    MissingParameter {
        /// Route name.
        route: String,
        /// The unresolved parameter.
        param: String,
    },

    /// No route is registered under the given name.
    #[error("No route named {name} can be found")]
    RouteNotFound {
        /// The requested name.
        name: String,
    },

    /// A route with the same name is already registered.
    #[error("Route '{name}' is already registered")]
    DuplicateRoute {
        /// The duplicated name.
        name: String,
    },

    /// A list-form definition did not carry a `name`.
    #[error("Route definition for path '{path}' has no name")]
    MissingName {
        /// Path of the unnamed definition.
        path: String,
    },
}

impl RouteError {
    /// Creates a bracket mismatch error.
    pub fn bracket_mismatch(path: impl Into<String>) -> Self {
        Self::BracketMismatch { path: path.into() }
    }

    /// Creates a missing parameter error.
    pub fn missing_parameter(route: impl Into<String>, param: impl Into<String>) -> Self {
        Self::MissingParameter {
            route: route.into(),
            param: param.into(),
        }
    }

    /// Creates a route-not-found error.
    pub fn route_not_found(name: impl Into<String>) -> Self {
        Self::RouteNotFound { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouteError::bracket_mismatch("/search:keyword]");
        assert_eq!(
            err.to_string(),
            "Bracket mismatch detected in path '/search:keyword]'"
        );

        let err = RouteError::missing_parameter("user", "id");
        assert_eq!(err.to_string(), "Missing id in params for route 'user'");

        let err = RouteError::route_not_found("nope");
        assert_eq!(err.to_string(), "No route named nope can be found");
    }
}
