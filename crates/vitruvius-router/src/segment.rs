//! Segment-path compilation.
//!
//! A segment path mixes literal text, named parameters (`:name`) and
//! optional groups (`[...]`, nestable):
//!
//! ```text
//! /search[/:keyword[/page/:page]]
//!
//! Static("/search")
//! Optional
//! ├── Static("/")
//! ├── Param("keyword")
//! └── Optional
//!     ├── Static("/page/")
//!     └── Param("page")
//! ```
//!
//! The same tree drives both the match pattern and reverse assembly.

use indexmap::IndexMap;

use crate::error::{RouteError, RouteResult};

/// Default constraint for a parameter with no entry in `requires`.
pub const DEFAULT_PARAM_PATTERN: &str = "[^/]+";

/// A node in the compiled segment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, matched verbatim.
    Static(String),
    /// A named parameter.
    Param(String),
    /// An optional group of nested segments.
    Optional(Vec<Segment>),
}

/// Parses a segment path into its structural tree.
///
/// # Errors
///
/// Returns [`RouteError::BracketMismatch`] when a `]` closes nothing or a
/// `[` is never closed.
///
/// # Example
///
/// ```rust
/// use vitruvius_router::segment::{parse, Segment};
///
/// let tree = parse("/search[/:keyword]").unwrap();
/// assert_eq!(tree, vec![
///     Segment::Static("/search".into()),
///     Segment::Optional(vec![
///         Segment::Static("/".into()),
///         Segment::Param("keyword".into()),
///     ]),
/// ]);
/// ```
pub fn parse(path: &str) -> RouteResult<Vec<Segment>> {
    // stack[0] is the root list; each open `[` pushes a child list
    let mut stack: Vec<Vec<Segment>> = vec![Vec::new()];
    let mut literal = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ':' => {
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if is_param_terminator(next) {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                if name.is_empty() {
                    literal.push(':');
                    continue;
                }
                flush_literal(&mut literal, &mut stack);
                push_segment(&mut stack, Segment::Param(name));
            }
            '[' => {
                flush_literal(&mut literal, &mut stack);
                stack.push(Vec::new());
            }
            ']' => {
                flush_literal(&mut literal, &mut stack);
                if stack.len() == 1 {
                    return Err(RouteError::bracket_mismatch(path));
                }
                let group = stack.pop().unwrap_or_default();
                push_segment(&mut stack, Segment::Optional(group));
            }
            other => literal.push(other),
        }
    }

    flush_literal(&mut literal, &mut stack);
    if stack.len() != 1 {
        return Err(RouteError::bracket_mismatch(path));
    }
    Ok(stack.pop().unwrap_or_default())
}

/// Converts a segment tree into an anchored regex source string.
///
/// Parameters use their `requires` entry as the capture pattern, falling back
/// to [`DEFAULT_PARAM_PATTERN`].
#[must_use]
pub fn to_pattern(segments: &[Segment], requires: &IndexMap<String, String>) -> String {
    let mut pattern = String::from("^");
    write_pattern(segments, requires, &mut pattern);
    pattern.push('$');
    pattern
}

fn write_pattern(segments: &[Segment], requires: &IndexMap<String, String>, out: &mut String) {
    for segment in segments {
        match segment {
            Segment::Static(text) => out.push_str(&regex::escape(text)),
            Segment::Param(name) => {
                let constraint = requires
                    .get(name)
                    .map_or(DEFAULT_PARAM_PATTERN, String::as_str);
                out.push_str("(?P<");
                out.push_str(name);
                out.push('>');
                out.push_str(constraint);
                out.push(')');
            }
            Segment::Optional(children) => {
                out.push_str("(?:");
                write_pattern(children, requires, out);
                out.push_str(")?");
            }
        }
    }
}

/// Rebuilds a path from the segment tree.
///
/// `lookup` resolves a parameter name to its value; empty values count as
/// missing. A missing parameter inside an optional group drops that
/// (innermost) group. Outside any group it is an error.
///
/// # Errors
///
/// Returns [`RouteError::MissingParameter`] naming the first unresolved
/// placeholder outside an optional group.
pub fn build_path<'v, F>(route: &str, segments: &[Segment], lookup: F) -> RouteResult<String>
where
    F: Fn(&str) -> Option<&'v str>,
{
    match build_group(segments, &lookup, false) {
        Ok(Some(path)) => Ok(path),
        Ok(None) => Ok(String::new()),
        Err(param) => Err(RouteError::missing_parameter(route, param)),
    }
}

// Ok(None) means "drop this optional group"; Err carries the missing name.
fn build_group<'v, F>(segments: &[Segment], lookup: &F, optional: bool) -> Result<Option<String>, String>
where
    F: Fn(&str) -> Option<&'v str>,
{
    let mut path = String::new();
    for segment in segments {
        match segment {
            Segment::Static(text) => path.push_str(text),
            Segment::Param(name) => match lookup(name).filter(|v| !v.is_empty()) {
                Some(value) => path.push_str(value),
                None if optional => return Ok(None),
                None => return Err(name.clone()),
            },
            Segment::Optional(children) => {
                if let Some(part) = build_group(children, lookup, true)? {
                    path.push_str(&part);
                }
            }
        }
    }
    Ok(Some(path))
}

fn is_param_terminator(c: char) -> bool {
    matches!(c, ':' | '/' | '[' | ']')
}

fn flush_literal(literal: &mut String, stack: &mut [Vec<Segment>]) {
    if !literal.is_empty() {
        let text = std::mem::take(literal);
        push_segment(stack, Segment::Static(text));
    }
}

fn push_segment(stack: &mut [Vec<Segment>], segment: Segment) {
    if let Some(top) = stack.last_mut() {
        top.push(segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requires(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_static_only() {
        let tree = parse("/about/team").unwrap();
        assert_eq!(tree, vec![Segment::Static("/about/team".into())]);
    }

    #[test]
    fn test_parse_params() {
        let tree = parse("/users/:id/posts/:post").unwrap();
        assert_eq!(
            tree,
            vec![
                Segment::Static("/users/".into()),
                Segment::Param("id".into()),
                Segment::Static("/posts/".into()),
                Segment::Param("post".into()),
            ]
        );
    }

    #[test]
    fn test_parse_nested_optional() {
        let tree = parse("/a[/b[/:c]]").unwrap();
        assert_eq!(
            tree,
            vec![
                Segment::Static("/a".into()),
                Segment::Optional(vec![
                    Segment::Static("/b".into()),
                    Segment::Optional(vec![
                        Segment::Static("/".into()),
                        Segment::Param("c".into()),
                    ]),
                ]),
            ]
        );
    }

    #[test]
    fn test_parse_unbalanced_close() {
        let err = parse("/search:keyword]").unwrap_err();
        assert!(matches!(err, RouteError::BracketMismatch { .. }));
    }

    #[test]
    fn test_parse_unclosed_open() {
        let err = parse("/search[/:keyword").unwrap_err();
        assert!(matches!(err, RouteError::BracketMismatch { .. }));
    }

    #[test]
    fn test_parse_bare_colon_is_literal() {
        let tree = parse("/time/12:/x").unwrap();
        assert_eq!(tree, vec![Segment::Static("/time/12:/x".into())]);
    }

    #[test]
    fn test_pattern_default_constraint() {
        let tree = parse("/search[/:keyword]").unwrap();
        assert_eq!(
            to_pattern(&tree, &IndexMap::new()),
            "^/search(?:/(?P<keyword>[^/]+))?$"
        );
    }

    #[test]
    fn test_pattern_uses_requires() {
        let tree = parse("/users/:id").unwrap();
        let pattern = to_pattern(&tree, &requires(&[("id", r"\d+")]));
        assert_eq!(pattern, r"^/users/(?P<id>\d+)$");
    }

    #[test]
    fn test_pattern_escapes_static() {
        let tree = parse("/file.json").unwrap();
        assert_eq!(to_pattern(&tree, &IndexMap::new()), r"^/file\.json$");
    }

    #[test]
    fn test_build_path_drops_optional() {
        let tree = parse("/search[/:keyword]").unwrap();
        let path = build_path("search", &tree, |_| None).unwrap();
        assert_eq!(path, "/search");

        let path = build_path("search", &tree, |name| (name == "keyword").then_some("abc")).unwrap();
        assert_eq!(path, "/search/abc");
    }

    #[test]
    fn test_build_path_nested_keeps_outer() {
        let tree = parse("/a[/:b[/:c]]").unwrap();
        let path = build_path("r", &tree, |name| (name == "b").then_some("x")).unwrap();
        assert_eq!(path, "/a/x");
    }

    #[test]
    fn test_build_path_missing_required() {
        let tree = parse("/users/:id").unwrap();
        let err = build_path("user", &tree, |_| None).unwrap_err();
        match err {
            RouteError::MissingParameter { route, param } => {
                assert_eq!(route, "user");
                assert_eq!(param, "id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_build_path_empty_value_is_missing() {
        let tree = parse("/search[/:keyword]").unwrap();
        let path = build_path("search", &tree, |_| Some("")).unwrap();
        assert_eq!(path, "/search");
    }
}
