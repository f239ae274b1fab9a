//! Format token to MIME type aliases.
//!
//! The table is ordered: when a MIME type appears under several formats the
//! first entry wins during negotiation.

/// Known formats and the MIME types that select them. The first MIME type of
/// each entry is the canonical `Content-Type` for the format.
pub const MIME_TYPES: &[(&str, &[&str])] = &[
    ("txt", &["text/plain"]),
    ("html", &["text/html", "application/xhtml+xml"]),
    ("css", &["text/css"]),
    (
        "js",
        &["text/javascript", "application/javascript", "application/x-javascript"],
    ),
    ("xml", &["application/xml", "text/xml", "application/x-xml"]),
    (
        "json",
        &["application/json", "text/x-json", "application/jsonrequest"],
    ),
    ("rss", &["application/rss+xml"]),
    ("atom", &["application/atom+xml"]),
    ("yaml", &["application/x-yaml", "text/yaml"]),
    ("csv", &["text/csv"]),
    ("ics", &["text/calendar"]),
    ("vcf", &["text/x-vcard"]),
    ("multipart_form", &["multipart/form-data"]),
    ("url_encoded_form", &["application/x-www-form-urlencoded"]),
];

/// Returns the MIME types registered for a format.
#[must_use]
pub fn mime_types(format: &str) -> Option<&'static [&'static str]> {
    MIME_TYPES
        .iter()
        .find(|(name, _)| *name == format)
        .map(|(_, types)| *types)
}

/// Returns the first format whose aliases include `mime`.
#[must_use]
pub fn format_for_mime(mime: &str) -> Option<&'static str> {
    let mime = mime.trim();
    MIME_TYPES
        .iter()
        .find(|(_, types)| types.iter().any(|t| t.eq_ignore_ascii_case(mime)))
        .map(|(name, _)| *name)
}

/// Negotiates a format token from an `Accept` header value.
///
/// Media ranges are considered in header order with parameters (`;q=...`)
/// stripped; the first one with a known alias wins. Wildcards never match.
///
/// # Example
///
/// ```rust
/// use vitruvius_router::mime::negotiate;
///
/// assert_eq!(negotiate("application/json"), Some("json"));
/// assert_eq!(negotiate("image/webp, text/html;q=0.9"), Some("html"));
/// assert_eq!(negotiate("*/*"), None);
/// ```
#[must_use]
pub fn negotiate(accept: &str) -> Option<&'static str> {
    accept
        .split(',')
        .filter_map(|range| range.split(';').next())
        .find_map(format_for_mime)
}

/// Resolves the `Content-Type` used when rendering a format.
///
/// Known formats use their canonical MIME type, a value that already looks
/// like a MIME type is used verbatim, anything else becomes `text/<format>`.
#[must_use]
pub fn content_type(format: &str) -> String {
    if let Some(first) = mime_types(format).and_then(|types| types.first()) {
        return (*first).to_string();
    }
    if format.contains('/') {
        format.to_string()
    } else {
        format!("text/{format}")
    }
}
