//! Segment-path router for Vitruvius.
//!
//! This crate turns declarative route tables into compiled, priority-ordered
//! [`Route`]s, matches requests against them and assembles paths back from
//! parameters.
//!
//! # Features
//!
//! - **Segment paths**: literals, named parameters (`:id`) and nestable
//!   optional groups (`[/:page]`)
//! - **Constraints**: accepted methods, subdomains, parameter patterns,
//!   required query values and a negotiated response format
//! - **Priority ordering**: highest priority first, ties last-declared-first
//! - **Reverse assembly**: build a URL path from a route name and parameters
//! - **Child routes**: nested definitions with concatenated paths and
//!   `parent/child` names
//!
//! # Example
//!
//! ```rust
//! use vitruvius_router::{RouteTable, Router, Params};
//!
//! let table: RouteTable = serde_json::from_str(r#"{
//!     "home":   {"path": "/", "options": {"handler": "home"}},
//!     "search": {"path": "/search[/:keyword]", "priority": 10}
//! }"#).unwrap();
//!
//! let router = Router::from_table(&table).unwrap();
//! assert_eq!(router.assemble("search", &Params::new()).unwrap(), "/search");
//! assert_eq!(
//!     router.assemble("search", &Params::from([("keyword", "rust")])).unwrap(),
//!     "/search/rust"
//! );
//! ```
//!
//! # Matching
//!
//! ```text
//!  request ──► method ──► subdomain ──► format ──► path regex ──► query
//!                │            │            │            │           │
//!               none         none         none         none        none
//! ```
//!
//! Each step can reject the request; a rejection is `None`, never an error.

pub mod definition;
pub mod error;
pub mod mime;
mod params;
mod route;
mod router;
pub mod segment;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use definition::{RouteDefinition, RouteTable};
pub use error::{RouteError, RouteResult};
pub use params::Params;
pub use route::{RoutableRequest, Route, RouteBuilder, Subdomain, DEFAULT_PRIORITY};
pub use router::Router;

/// A matched route with its merged parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The route that matched
    pub route: Arc<Route>,
    /// Defaults, negotiated format, path captures and query values
    pub params: Params,
}

impl RouteMatch {
    /// Creates a new route match.
    #[must_use]
    pub fn new(route: Arc<Route>, params: Params) -> Self {
        Self { route, params }
    }

    /// Name of the matched route.
    #[must_use]
    pub fn name(&self) -> &str {
        self.route.name()
    }

    /// Handler identifier of the matched route.
    #[must_use]
    pub fn handler(&self) -> Option<&str> {
        self.route.handler()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRequest;
    use proptest::prelude::*;

    #[test]
    fn test_match_then_assemble() {
        let route = Arc::new(
            Route::builder("post", "/blog/:year/:slug")
                .build()
                .unwrap(),
        );
        let m = route
            .match_request(&FakeRequest::get("/blog/2024/hello-world"))
            .unwrap();
        assert_eq!(m.name(), "post");
        assert_eq!(route.assemble(&m.params).unwrap(), "/blog/2024/hello-world");
    }

    proptest! {
        #[test]
        fn prop_assemble_reproduces_matched_path(
            parts in proptest::collection::vec(("[a-z]{1,8}", "[a-z0-9_-]{1,12}"), 1..5)
        ) {
            // "/lit0/:p0/lit1/:p1..." matched by "/lit0/val0/lit1/val1..."
            let mut path = String::new();
            let mut url = String::new();
            for (i, (literal, value)) in parts.iter().enumerate() {
                path.push_str(&format!("/{literal}/:p{i}"));
                url.push_str(&format!("/{literal}/{value}"));
            }

            let route = Arc::new(Route::builder("r", path).build().unwrap());
            let m = route.match_request(&FakeRequest::get(&url)).unwrap();
            prop_assert_eq!(route.assemble(&m.params).unwrap(), url);
        }
    }
}
