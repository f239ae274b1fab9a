//! Incoming request representation.
//!
//! The transport layer hands over an already-parsed `http::Request<Bytes>`;
//! [`Request`] adds the derived views the lifecycle needs: decoded query and
//! form values, cookies, host and subdomain.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, COOKIE, HOST};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vitruvius_router::RoutableRequest;

use crate::cookie::parse_cookie_header;

/// A unique identifier for each request, using UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A parsed HTTP request.
///
/// # Example
///
/// ```
/// use vitruvius_core::Request;
/// use http::{Method, Uri};
///
/// let request = Request::new(Method::GET, Uri::from_static("/search?keyword=rust"));
/// assert_eq!(request.path(), "/search");
/// assert_eq!(request.query_value("keyword"), Some("rust"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    query: IndexMap<String, String>,
    form: IndexMap<String, String>,
    cookies: IndexMap<String, String>,
}

impl Request {
    /// Creates a request with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        let query = parse_query(&uri);
        Self {
            id: RequestId::new(),
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            query,
            form: IndexMap::new(),
            cookies: IndexMap::new(),
        }
    }

    /// Adds a header, refreshing derived cookie and form views.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self.refresh();
        self
    }

    /// Sets the body, refreshing the derived form view.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self.refresh();
        self
    }

    /// Request ID for log correlation.
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The full request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The URL path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// All request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decoded query-string values.
    #[must_use]
    pub fn query(&self) -> &IndexMap<String, String> {
        &self.query
    }

    /// A single query-string value.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Decoded `application/x-www-form-urlencoded` body values.
    #[must_use]
    pub fn form(&self) -> &IndexMap<String, String> {
        &self.form
    }

    /// Cookies sent with the request.
    #[must_use]
    pub fn cookies(&self) -> &IndexMap<String, String> {
        &self.cookies
    }

    /// A single cookie value.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// The `Accept` header.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.header(ACCEPT)
    }

    /// Host name without port, from `Host` or the URI authority.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        let raw = self.header(HOST).or_else(|| self.uri.host())?;
        Some(raw.split(':').next().unwrap_or(raw))
    }

    /// Everything left of the registrable domain (`a.b` in `a.b.example.com`).
    #[must_use]
    pub fn subdomain(&self) -> Option<&str> {
        let host = self.host()?;
        let labels = host.split('.').count();
        if labels <= 2 {
            return None;
        }
        let registrable = host.rsplitn(3, '.').nth(2)?;
        Some(registrable)
    }

    /// Returns true for `POST` and `PUT`.
    #[must_use]
    pub fn is_write(&self) -> bool {
        self.method == Method::POST || self.method == Method::PUT
    }

    fn refresh(&mut self) {
        self.cookies = self
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(parse_cookie_header)
            .collect();

        let is_form = self
            .header(CONTENT_TYPE)
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        self.form = if is_form {
            serde_urlencoded::from_bytes::<Vec<(String, String)>>(&self.body)
                .map(|pairs| pairs.into_iter().collect())
                .unwrap_or_default()
        } else {
            IndexMap::new()
        };
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        let mut converted = Self::new(parts.method, parts.uri);
        converted.headers = parts.headers;
        converted.body = body;
        converted.refresh();
        converted
    }
}

impl RoutableRequest for Request {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        self.uri.path()
    }

    fn subdomain(&self) -> Option<&str> {
        Self::subdomain(self)
    }

    fn accept(&self) -> Option<&str> {
        Self::accept(self)
    }

    fn query_value(&self, key: &str) -> Option<&str> {
        Self::query_value(self, key)
    }

    fn has_query(&self) -> bool {
        !self.query.is_empty()
    }
}

fn parse_query(uri: &Uri) -> IndexMap<String, String> {
    uri.query()
        .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parsing() {
        let request = Request::new(Method::GET, Uri::from_static("/s?a=1&b=two%20words"));
        assert_eq!(request.query_value("a"), Some("1"));
        assert_eq!(request.query_value("b"), Some("two words"));
        assert!(RoutableRequest::has_query(&request));
    }

    #[test]
    fn test_form_parsing() {
        let request = Request::new(Method::POST, Uri::from_static("/login"))
            .with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .with_body("user=alice&remember=on");
        assert_eq!(request.form().get("user").map(String::as_str), Some("alice"));
        assert!(request.is_write());
    }

    #[test]
    fn test_form_ignored_for_other_content_types() {
        let request = Request::new(Method::POST, Uri::from_static("/"))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(r#"{"user":"alice"}"#);
        assert!(request.form().is_empty());
    }

    #[test]
    fn test_cookies() {
        let request = Request::new(Method::GET, Uri::from_static("/"))
            .with_header(COOKIE, HeaderValue::from_static("session=abc; theme=dark"));
        assert_eq!(request.cookie("session"), Some("abc"));
        assert_eq!(request.cookie("theme"), Some("dark"));
    }

    #[test]
    fn test_subdomain() {
        let request = Request::new(Method::GET, Uri::from_static("/"))
            .with_header(HOST, HeaderValue::from_static("admin.example.com:8080"));
        assert_eq!(request.host(), Some("admin.example.com"));
        assert_eq!(request.subdomain(), Some("admin"));

        let request = Request::new(Method::GET, Uri::from_static("/"))
            .with_header(HOST, HeaderValue::from_static("a.b.example.com"));
        assert_eq!(request.subdomain(), Some("a.b"));

        let request = Request::new(Method::GET, Uri::from_static("/"))
            .with_header(HOST, HeaderValue::from_static("example.com"));
        assert_eq!(request.subdomain(), None);
    }

    #[test]
    fn test_from_http_request() {
        let http_request = http::Request::builder()
            .method(Method::GET)
            .uri("http://api.example.com/users?page=2")
            .header(ACCEPT, "application/json")
            .body(Bytes::new())
            .unwrap();

        let request = Request::from(http_request);
        assert_eq!(request.path(), "/users");
        assert_eq!(request.accept(), Some("application/json"));
        assert_eq!(request.subdomain(), Some("api"));
        assert_eq!(request.query_value("page"), Some("2"));
    }
}
