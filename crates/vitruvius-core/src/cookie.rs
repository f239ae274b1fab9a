//! Cookie parsing and `Set-Cookie` construction.

use std::fmt;

use indexmap::IndexMap;

/// Parses a `Cookie` request header into name/value pairs.
///
/// Malformed pairs (no `=`) are skipped; a repeated name keeps the last value.
#[must_use]
pub fn parse_cookie_header(header: &str) -> IndexMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// The `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Sent only for same-site requests.
    Strict,
    /// Sent for same-site requests and top-level navigations.
    Lax,
    /// Always sent (requires `Secure`).
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax => write!(f, "Lax"),
            Self::None => write!(f, "None"),
        }
    }
}

/// Builder for a `Set-Cookie` response header.
///
/// # Example
///
/// ```rust
/// use vitruvius_core::SetCookie;
///
/// let cookie = SetCookie::new("session", "abc")
///     .path("/")
///     .max_age_secs(3600)
///     .http_only(true);
///
/// assert_eq!(
///     cookie.to_header_value(),
///     "session=abc; Path=/; Max-Age=3600; HttpOnly"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct SetCookie {
    name: String,
    value: String,
    path: Option<String>,
    max_age: Option<u64>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    /// Creates a cookie with a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// Creates an expired cookie that removes `name` on the client.
    pub fn remove(name: impl Into<String>) -> Self {
        Self::new(name, "").path("/").max_age_secs(0)
    }

    /// Sets the `Path` attribute.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets `Max-Age` in seconds.
    pub fn max_age_secs(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Sets the `Secure` flag.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the `HttpOnly` flag.
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Sets the `SameSite` attribute.
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Renders the header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];
        if let Some(path) = &self.path {
            parts.push(format!("Path={path}"));
        }
        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={max_age}"));
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }
        if let Some(same_site) = self.same_site {
            parts.push(format!("SameSite={same_site}"));
        }
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("a=1; b = 2;broken; ;c=x=y");
        assert_eq!(cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(cookies.get("b").map(String::as_str), Some("2"));
        assert_eq!(cookies.get("c").map(String::as_str), Some("x=y"));
        assert_eq!(cookies.len(), 3);
    }

    #[test]
    fn test_set_cookie_full() {
        let cookie = SetCookie::new("id", "42")
            .path("/app")
            .secure(true)
            .same_site(SameSite::Lax);
        assert_eq!(cookie.to_header_value(), "id=42; Path=/app; Secure; SameSite=Lax");
    }

    #[test]
    fn test_set_cookie_remove() {
        assert_eq!(
            SetCookie::remove("id").to_header_value(),
            "id=; Path=/; Max-Age=0"
        );
    }
}
