//! A single named route.
//!
//! A [`Route`] wraps a compiled segment pattern plus the constraints a
//! request must satisfy: accepted methods, subdomain, negotiated format and
//! required query values. Routes are immutable once built; matching produces
//! fresh [`Params`] and never mutates the route.

use std::fmt;
use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RouteError, RouteResult};
use crate::mime;
use crate::params::Params;
use crate::segment::{self, Segment};
use crate::RouteMatch;

/// Priority given to routes that do not set one.
pub const DEFAULT_PRIORITY: i32 = 1;

/// The view of an incoming request that routing needs.
///
/// Implemented by the framework request type; kept as a trait so the router
/// stays independent of any HTTP representation.
pub trait RoutableRequest {
    /// The request method.
    fn method(&self) -> &Method;

    /// The normalized URL path (no query string).
    fn path(&self) -> &str;

    /// The subdomain portion of the host, if any.
    fn subdomain(&self) -> Option<&str>;

    /// The raw `Accept` header value.
    fn accept(&self) -> Option<&str>;

    /// A single query-string value.
    fn query_value(&self, key: &str) -> Option<&str>;

    /// Whether the request carries any query parameters.
    fn has_query(&self) -> bool;
}

/// Subdomain constraint: a single value or a set of allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subdomain {
    /// Exactly this subdomain.
    One(String),
    /// Any of these subdomains.
    Many(Vec<String>),
}

impl Subdomain {
    /// Returns true if the request subdomain satisfies the constraint.
    ///
    /// A request without a subdomain is compared as the empty string.
    #[must_use]
    pub fn matches(&self, candidate: Option<&str>) -> bool {
        let candidate = candidate.unwrap_or("");
        match self {
            Self::One(expected) => expected == candidate,
            Self::Many(allowed) => allowed.iter().any(|s| s == candidate),
        }
    }
}

impl From<&str> for Subdomain {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<&str>> for Subdomain {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// A named, compiled route.
///
/// # Example
///
/// ```rust
/// use vitruvius_router::{Params, Route};
///
/// let route = Route::builder("search", "/search[/:keyword]").build().unwrap();
/// assert_eq!(route.assemble(&Params::new()).unwrap(), "/search");
/// assert_eq!(
///     route.assemble(&Params::from([("keyword", "rust")])).unwrap(),
///     "/search/rust"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    path: String,
    segments: Vec<Segment>,
    regex: Regex,
    accepts: Vec<Method>,
    requires: IndexMap<String, String>,
    format: Option<Regex>,
    defaults: IndexMap<String, String>,
    subdomain: Option<Subdomain>,
    priority: i32,
    options: IndexMap<String, Value>,
}

impl Route {
    /// Starts building a route with a name and segment path.
    pub fn builder(name: impl Into<String>, path: impl Into<String>) -> RouteBuilder {
        RouteBuilder::new(name, path)
    }

    /// Route name, unique within a router.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw segment path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The regex source used for matching.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// The structural tree used for assembly.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Accepted methods; empty accepts everything.
    #[must_use]
    pub fn accepts(&self) -> &[Method] {
        &self.accepts
    }

    /// Required values or patterns, keyed by parameter name.
    #[must_use]
    pub fn requires(&self) -> &IndexMap<String, String> {
        &self.requires
    }

    /// Default parameter values.
    #[must_use]
    pub fn defaults(&self) -> &IndexMap<String, String> {
        &self.defaults
    }

    /// The subdomain constraint, if any.
    #[must_use]
    pub fn subdomain(&self) -> Option<&Subdomain> {
        self.subdomain.as_ref()
    }

    /// Sort priority; higher sorts first.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Opaque handler options.
    #[must_use]
    pub fn options(&self) -> &IndexMap<String, Value> {
        &self.options
    }

    /// A single option value.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// The handler identifier from `options.handler` (or `options.controller`).
    #[must_use]
    pub fn handler(&self) -> Option<&str> {
        self.option("handler")
            .or_else(|| self.option("controller"))
            .and_then(Value::as_str)
    }

    /// Matches a request, returning the merged parameters.
    ///
    /// Checks run in order (method, subdomain, negotiated format, path,
    /// required query values) and the first failure yields `None`.
    /// Parameters merge as defaults, then format, then path captures, then
    /// required query values, later entries overriding earlier ones.
    pub fn match_params<R>(&self, request: &R) -> Option<Params>
    where
        R: RoutableRequest + ?Sized,
    {
        if !self.accepts.is_empty() && !self.accepts.contains(request.method()) {
            return None;
        }

        if let Some(subdomain) = &self.subdomain {
            if !subdomain.matches(request.subdomain()) {
                return None;
            }
        }

        let format = request.accept().and_then(mime::negotiate);
        if let (Some(constraint), Some(candidate)) = (&self.format, format) {
            if !constraint.is_match(candidate) {
                return None;
            }
        }

        let captures = self.regex.captures(request.path())?;

        let mut params = Params::with_capacity(self.defaults.len() + 2);
        params.extend(self.defaults.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(format) = format {
            params.insert("format", format);
        }
        for name in self.regex.capture_names().flatten() {
            if let Some(value) = captures.name(name) {
                params.insert(name, value.as_str());
            }
        }

        if !self.requires.is_empty() && request.has_query() {
            if self.requires.keys().all(|key| request.query_value(key).is_some()) {
                for key in self.requires.keys() {
                    if let Some(value) = request.query_value(key) {
                        params.insert(key.as_str(), value);
                    }
                }
            } else if !self.has_named_groups() {
                return None;
            }
        }

        Some(params)
    }

    /// Matches a request, pairing this route with the merged parameters.
    pub fn match_request<R>(self: &Arc<Self>, request: &R) -> Option<RouteMatch>
    where
        R: RoutableRequest + ?Sized,
    {
        self.match_params(request)
            .map(|params| RouteMatch::new(Arc::clone(self), params))
    }

    /// Rebuilds a path from parameters, falling back to route defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::MissingParameter`] when a placeholder outside an
    /// optional group cannot be resolved.
    pub fn assemble(&self, params: &Params) -> RouteResult<String> {
        segment::build_path(&self.name, &self.segments, |name| {
            params
                .get(name)
                .or_else(|| self.defaults.get(name).map(String::as_str))
        })
    }

    fn has_named_groups(&self) -> bool {
        self.regex.capture_names().flatten().next().is_some()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Route name:{} path:{} match:{}>",
            self.name,
            self.path,
            self.regex.as_str()
        )
    }
}

/// Builder for [`Route`].
#[derive(Debug, Clone)]
#[must_use]
pub struct RouteBuilder {
    name: String,
    path: String,
    accepts: Vec<Method>,
    requires: IndexMap<String, String>,
    defaults: IndexMap<String, String>,
    subdomain: Option<Subdomain>,
    priority: i32,
    options: IndexMap<String, Value>,
    regex: Option<String>,
}

impl RouteBuilder {
    /// Creates a builder with the given name and segment path.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            accepts: Vec::new(),
            requires: IndexMap::new(),
            defaults: IndexMap::new(),
            subdomain: None,
            priority: DEFAULT_PRIORITY,
            options: IndexMap::new(),
            regex: None,
        }
    }

    /// Adds an accepted method.
    pub fn accept(mut self, method: Method) -> Self {
        if !self.accepts.contains(&method) {
            self.accepts.push(method);
        }
        self
    }

    /// Adds several accepted methods.
    pub fn accepts(self, methods: impl IntoIterator<Item = Method>) -> Self {
        methods.into_iter().fold(self, Self::accept)
    }

    /// Requires a parameter to match a pattern (or, for query-only keys, to
    /// be present in the query string).
    pub fn requires(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.requires.insert(name.into(), pattern.into());
        self
    }

    /// Sets a default parameter value.
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Restricts the route to a subdomain or set of subdomains.
    pub fn subdomain(mut self, subdomain: impl Into<Subdomain>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    /// Sets the sort priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets an opaque option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Sets the handler identifier.
    pub fn handler(self, id: impl Into<String>) -> Self {
        self.option("handler", id.into())
    }

    /// Matches with an explicit regex instead of the compiled segment
    /// pattern. The segment path is still used for assembly.
    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    /// Compiles the route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::BracketMismatch`] for unbalanced optional groups
    /// and [`RouteError::InvalidPattern`] when a pattern fails to compile.
    pub fn build(self) -> RouteResult<Route> {
        let segments = segment::parse(&self.path)?;
        let source = match &self.regex {
            Some(explicit) => format!("^(?:{explicit})"),
            None => segment::to_pattern(&segments, &self.requires),
        };
        let regex = compile(&self.name, &source)?;
        let format = self
            .requires
            .get("format")
            .map(|pattern| compile(&self.name, &format!("^(?:{pattern})$")))
            .transpose()?;

        Ok(Route {
            name: self.name,
            path: self.path,
            segments,
            regex,
            accepts: self.accepts,
            requires: self.requires,
            format,
            defaults: self.defaults,
            subdomain: self.subdomain,
            priority: self.priority,
            options: self.options,
        })
    }
}

fn compile(route: &str, source: &str) -> RouteResult<Regex> {
    Regex::new(source).map_err(|source| RouteError::InvalidPattern {
        route: route.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRequest;

    fn route(name: &str, path: &str) -> Arc<Route> {
        Arc::new(Route::builder(name, path).build().unwrap())
    }

    #[test]
    fn test_static_route_matches_exact_path() {
        let home = route("home", "/");
        let m = home.match_request(&FakeRequest::get("/")).unwrap();
        assert_eq!(m.route.name(), "home");
        assert!(m.params.is_empty());

        assert!(home.match_request(&FakeRequest::get("/other")).is_none());
    }

    #[test]
    fn test_optional_keyword() {
        let search = route("search", "/search[/:keyword]");

        let m = search.match_request(&FakeRequest::get("/search")).unwrap();
        assert!(m.params.get("keyword").is_none());

        let m = search.match_request(&FakeRequest::get("/search/abc")).unwrap();
        assert_eq!(m.params.get("keyword"), Some("abc"));

        assert_eq!(search.assemble(&Params::new()).unwrap(), "/search");
        assert_eq!(
            search.assemble(&Params::from([("keyword", "abc")])).unwrap(),
            "/search/abc"
        );
    }

    #[test]
    fn test_pattern_anchored_at_start() {
        let child = route("child", "/child");
        assert!(child.match_request(&FakeRequest::get("/parent/child")).is_none());
    }

    #[test]
    fn test_method_constraint() {
        let r = Arc::new(
            Route::builder("create", "/users")
                .accepts([Method::POST, Method::PUT])
                .build()
                .unwrap(),
        );
        assert!(r.match_request(&FakeRequest::get("/users")).is_none());
        assert!(r
            .match_request(&FakeRequest::new(Method::POST, "/users"))
            .is_some());
    }

    #[test]
    fn test_subdomain_constraint() {
        let single = Arc::new(
            Route::builder("admin", "/").subdomain("admin").build().unwrap(),
        );
        assert!(single
            .match_request(&FakeRequest::get("/").with_subdomain("admin"))
            .is_some());
        assert!(single
            .match_request(&FakeRequest::get("/").with_subdomain("www"))
            .is_none());
        assert!(single.match_request(&FakeRequest::get("/")).is_none());

        let many = Arc::new(
            Route::builder("sites", "/")
                .subdomain(vec!["a", "b"])
                .build()
                .unwrap(),
        );
        assert!(many
            .match_request(&FakeRequest::get("/").with_subdomain("b"))
            .is_some());
        assert!(many
            .match_request(&FakeRequest::get("/").with_subdomain("c"))
            .is_none());
    }

    #[test]
    fn test_format_negotiated_into_params() {
        let r = route("home", "/");
        let m = r
            .match_request(&FakeRequest::get("/").with_accept("application/json"))
            .unwrap();
        assert_eq!(m.params.get("format"), Some("json"));

        let m = r.match_request(&FakeRequest::get("/")).unwrap();
        assert!(m.params.get("format").is_none());
    }

    #[test]
    fn test_format_constraint_rejects_other_formats() {
        let r = Arc::new(
            Route::builder("api", "/api")
                .requires("format", "json|xml")
                .build()
                .unwrap(),
        );
        assert!(r
            .match_request(&FakeRequest::get("/api").with_accept("application/json"))
            .is_some());
        assert!(r
            .match_request(&FakeRequest::get("/api").with_accept("text/html"))
            .is_none());
        // no negotiated format: constraint not applied
        assert!(r.match_request(&FakeRequest::get("/api")).is_some());
    }

    #[test]
    fn test_requires_satisfied_from_query() {
        let r = Arc::new(
            Route::builder("search", "/search")
                .requires("keyword", ".*")
                .build()
                .unwrap(),
        );
        let m = r
            .match_request(&FakeRequest::get("/search").with_query("keyword", "value"))
            .unwrap();
        assert_eq!(m.params.get("keyword"), Some("value"));

        // a query without every required key and no captures fails
        assert!(r
            .match_request(&FakeRequest::get("/search").with_query("other", "1"))
            .is_none());
    }

    #[test]
    fn test_requires_falls_back_to_captures() {
        let r = Arc::new(
            Route::builder("user", "/users/:id")
                .requires("id", r"\d+")
                .build()
                .unwrap(),
        );
        let m = r
            .match_request(&FakeRequest::get("/users/42").with_query("page", "2"))
            .unwrap();
        assert_eq!(m.params.get("id"), Some("42"));
        assert!(r.match_request(&FakeRequest::get("/users/abc")).is_none());
    }

    #[test]
    fn test_query_overrides_capture() {
        let r = Arc::new(
            Route::builder("search", "/search/:keyword")
                .requires("keyword", "[a-z]+")
                .build()
                .unwrap(),
        );
        let m = r
            .match_request(&FakeRequest::get("/search/path").with_query("keyword", "query"))
            .unwrap();
        assert_eq!(m.params.get("keyword"), Some("query"));
    }

    #[test]
    fn test_defaults_merge_and_assemble() {
        let r = Arc::new(
            Route::builder("list", "/posts[/:page]")
                .default_value("page", "1")
                .default_value("sort", "desc")
                .build()
                .unwrap(),
        );
        let m = r.match_request(&FakeRequest::get("/posts")).unwrap();
        assert_eq!(m.params.get("page"), Some("1"));
        assert_eq!(m.params.get("sort"), Some("desc"));

        let m = r.match_request(&FakeRequest::get("/posts/3")).unwrap();
        assert_eq!(m.params.get("page"), Some("3"));

        assert_eq!(r.assemble(&Params::new()).unwrap(), "/posts/1");
    }

    #[test]
    fn test_explicit_regex() {
        let r = Arc::new(
            Route::builder("legacy", "/legacy/:id")
                .regex(r"/old/(?P<id>\d+)$")
                .build()
                .unwrap(),
        );
        let m = r.match_request(&FakeRequest::get("/old/9")).unwrap();
        assert_eq!(m.params.get("id"), Some("9"));
        assert!(r.match_request(&FakeRequest::get("/legacy/9")).is_none());
        assert_eq!(r.assemble(&m.params).unwrap(), "/legacy/9");
    }

    #[test]
    fn test_bracket_mismatch_is_construction_error() {
        let err = Route::builder("search", "/search:keyword]").build().unwrap_err();
        assert!(matches!(err, RouteError::BracketMismatch { .. }));
    }

    #[test]
    fn test_invalid_requirement_pattern() {
        let err = Route::builder("bad", "/x/:id")
            .requires("id", "(")
            .build()
            .unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }));
    }

    #[test]
    fn test_handler_option() {
        let r = Route::builder("home", "/").handler("home_controller").build().unwrap();
        assert_eq!(r.handler(), Some("home_controller"));
        assert_eq!(r.priority(), DEFAULT_PRIORITY);

        let r = Route::builder("home", "/")
            .option("controller", "legacy_controller")
            .build()
            .unwrap();
        assert_eq!(r.handler(), Some("legacy_controller"));
    }

    #[test]
    fn test_display() {
        let r = route("search", "/search");
        assert_eq!(r.to_string(), "<Route name:search path:/search match:^/search$>");
    }
}
