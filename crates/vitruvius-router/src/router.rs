//! Priority-ordered route collection.
//!
//! This module provides the [`Router`], which owns every compiled
//! [`Route`] keyed by name and keeps them sorted for matching.
//!
//! # Ordering
//!
//! Routes are sorted by descending priority. Routes that share a priority
//! keep **reverse** insertion order: the route declared last is tried first.
//! Every insertion receives a monotonically increasing sequence number and
//! the sort key is `(priority desc, sequence desc)`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::definition::RouteTable;
use crate::error::{RouteError, RouteResult};
use crate::params::Params;
use crate::route::{RoutableRequest, Route};
use crate::RouteMatch;

#[derive(Debug, Clone)]
struct Entry {
    sequence: u64,
    route: Arc<Route>,
}

/// An ordered, name-indexed collection of routes.
///
/// Built once at bootstrap and read-only afterwards; share it behind an
/// `Arc` across concurrent requests.
///
/// # Example
///
/// ```rust
/// use vitruvius_router::{Route, Router};
///
/// let mut router = Router::new();
/// router.add_route(Route::builder("home", "/").build().unwrap()).unwrap();
/// router.add_route(Route::builder("search", "/search[/:keyword]").build().unwrap()).unwrap();
///
/// assert_eq!(router.len(), 2);
/// assert_eq!(router.assemble("search", &[("keyword", "rust")].into()).unwrap(), "/search/rust");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: IndexMap<String, Entry>,
    next_sequence: u64,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a router from a declarative table, expanding child routes.
    ///
    /// # Errors
    ///
    /// Returns the first compile error, or [`RouteError::DuplicateRoute`]
    /// when two definitions resolve to the same name.
    pub fn from_table(table: &RouteTable) -> RouteResult<Self> {
        let mut router = Self::new();
        for route in table.compile()? {
            router.add_route(route)?;
        }
        tracing::debug!(routes = router.len(), "router built");
        Ok(router)
    }

    /// Adds a compiled route and re-sorts.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicateRoute`] if the name is taken.
    pub fn add_route(&mut self, route: Route) -> RouteResult<()> {
        if self.routes.contains_key(route.name()) {
            return Err(RouteError::DuplicateRoute {
                name: route.name().to_string(),
            });
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.routes.insert(
            route.name().to_string(),
            Entry {
                sequence,
                route: Arc::new(route),
            },
        );
        self.sort();
        Ok(())
    }

    /// Lazily yields a match for every route that accepts the request, in
    /// priority order. Take the first item for the winning route.
    pub fn matches<'r, R>(&'r self, request: &'r R) -> impl Iterator<Item = RouteMatch> + 'r
    where
        R: RoutableRequest + ?Sized,
    {
        self.routes
            .values()
            .filter_map(move |entry| entry.route.match_request(request))
    }

    /// Returns the highest-priority match, if any.
    pub fn first_match<R>(&self, request: &R) -> Option<RouteMatch>
    where
        R: RoutableRequest + ?Sized,
    {
        self.matches(request).next()
    }

    /// Assembles a path for the named route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::RouteNotFound`] for an unknown name, or the
    /// route's assembly error.
    pub fn assemble(&self, name: &str, params: &Params) -> RouteResult<String> {
        self.get(name)
            .ok_or_else(|| RouteError::route_not_found(name))?
            .assemble(params)
    }

    /// Looks up a route by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Route>> {
        self.routes.get(name).map(|entry| &entry.route)
    }

    /// Returns true if a route with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates routes in matching order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.values().map(|entry| &entry.route)
    }

    fn sort(&mut self) {
        self.routes.sort_by(|_, a, _, b| {
            b.route
                .priority()
                .cmp(&a.route.priority())
                .then(b.sequence.cmp(&a.sequence))
        });
    }
}

impl TryFrom<&RouteTable> for Router {
    type Error = RouteError;

    fn try_from(table: &RouteTable) -> RouteResult<Self> {
        Self::from_table(table)
    }
}

impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Router routes:{}>", self.routes.len())
    }
}
