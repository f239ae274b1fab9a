//! Declarative route tables.
//!
//! Routes can be declared as a map keyed by name or as a list whose entries
//! carry their own `name`. Both deserialize from any serde format:
//!
//! ```json
//! {
//!   "home":   { "path": "/", "options": { "handler": "home" } },
//!   "search": { "path": "/search[/:keyword]", "priority": 10,
//!               "children": { "page": { "path": "/page/:page" } } }
//! }
//! ```

use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RouteError, RouteResult};
use crate::route::{Route, RouteBuilder, Subdomain, DEFAULT_PRIORITY};

/// A single route declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDefinition {
    /// Route name; required in list form, ignored in map form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Segment path.
    pub path: String,

    /// Opaque handler options (at least `handler`).
    #[serde(default)]
    pub options: IndexMap<String, Value>,

    /// Accepted HTTP methods; empty accepts all.
    #[serde(default)]
    pub accepts: Vec<String>,

    /// Required parameter patterns.
    #[serde(default)]
    pub requires: IndexMap<String, String>,

    /// Default parameter values. Scalars are stringified, nulls ignored.
    #[serde(default)]
    pub defaults: IndexMap<String, Value>,

    /// Subdomain constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<Subdomain>,

    /// Sort priority.
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Explicit match regex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    /// Child routes; paths and names are prefixed by this route's.
    #[serde(default)]
    pub children: IndexMap<String, RouteDefinition>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl RouteDefinition {
    /// Creates a definition for a path with everything else defaulted.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            priority: DEFAULT_PRIORITY,
            ..Self::default()
        }
    }

    /// Compiles this definition (without children) under the given name.
    ///
    /// # Errors
    ///
    /// Returns the compile error of the route, or
    /// [`RouteError::InvalidMethod`] for an unparseable `accepts` entry.
    pub fn to_route(&self, name: &str) -> RouteResult<Route> {
        let mut builder = RouteBuilder::new(name, self.path.clone()).priority(self.priority);

        for method in &self.accepts {
            let parsed = Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| {
                RouteError::InvalidMethod {
                    route: name.to_string(),
                    method: method.clone(),
                }
            })?;
            builder = builder.accept(parsed);
        }
        for (key, pattern) in &self.requires {
            builder = builder.requires(key.clone(), pattern.clone());
        }
        for (key, value) in &self.defaults {
            if let Some(value) = stringify(value) {
                builder = builder.default_value(key.clone(), value);
            }
        }
        for (key, value) in &self.options {
            builder = builder.option(key.clone(), value.clone());
        }
        if let Some(subdomain) = &self.subdomain {
            builder = builder.subdomain(subdomain.clone());
        }
        if let Some(regex) = &self.regex {
            builder = builder.regex(regex.clone());
        }

        builder.build()
    }
}

/// A route table in either accepted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteTable {
    /// `{ name: definition, ... }`
    Named(IndexMap<String, RouteDefinition>),
    /// `[ { name, ... }, ... ]`
    List(Vec<RouteDefinition>),
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::Named(IndexMap::new())
    }
}

impl RouteTable {
    /// Flattens the table into `(name, route)` pairs in declaration order,
    /// each parent followed by its children (depth first).
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::MissingName`] for an unnamed list entry, or any
    /// compile error.
    pub fn compile(&self) -> RouteResult<Vec<Route>> {
        let mut routes = Vec::new();
        match self {
            Self::Named(entries) => {
                for (name, definition) in entries {
                    expand(name, definition, &mut routes)?;
                }
            }
            Self::List(entries) => {
                for definition in entries {
                    let name = definition.name.as_deref().ok_or_else(|| {
                        RouteError::MissingName {
                            path: definition.path.clone(),
                        }
                    })?;
                    expand(name, definition, &mut routes)?;
                }
            }
        }
        Ok(routes)
    }
}

fn expand(name: &str, definition: &RouteDefinition, out: &mut Vec<Route>) -> RouteResult<()> {
    out.push(definition.to_route(name)?);
    for (child_name, child) in &definition.children {
        let mut child = child.clone();
        child.path = format!("{}{}", definition.path, child.path);
        expand(&format!("{name}/{child_name}"), &child, out)?;
    }
    Ok(())
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_table_from_json() {
        let table: RouteTable = serde_json::from_str(
            r#"{
                "home": {"path": "/", "options": {"handler": "home"}},
                "user": {"path": "/users/:id", "accepts": ["get"], "defaults": {"page": 1}}
            }"#,
        )
        .unwrap();

        let routes = table.compile().unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].name(), "home");
        assert_eq!(routes[0].handler(), Some("home"));
        assert_eq!(routes[1].accepts(), &[Method::GET]);
        assert_eq!(routes[1].defaults().get("page").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_list_table_requires_names() {
        let table: RouteTable =
            serde_json::from_str(r#"[{"name": "home", "path": "/"}, {"path": "/x"}]"#).unwrap();
        let err = table.compile().unwrap_err();
        assert!(matches!(err, RouteError::MissingName { .. }));
    }

    #[test]
    fn test_children_concatenate_paths_and_names() {
        let table: RouteTable = serde_json::from_str(
            r#"{
                "parent": {
                    "path": "/parent",
                    "children": {
                        "child": {
                            "path": "/child",
                            "children": {"leaf": {"path": "/leaf"}}
                        }
                    }
                }
            }"#,
        )
        .unwrap();

        let routes = table.compile().unwrap();
        let names: Vec<_> = routes.iter().map(Route::name).collect();
        assert_eq!(names, vec!["parent", "parent/child", "parent/child/leaf"]);
        assert_eq!(routes[1].path(), "/parent/child");
        assert_eq!(routes[2].path(), "/parent/child/leaf");
    }

    #[test]
    fn test_invalid_method() {
        let table: RouteTable =
            serde_json::from_str(r#"{"bad": {"path": "/", "accepts": ["NOT A METHOD"]}}"#)
                .unwrap();
        assert!(matches!(
            table.compile().unwrap_err(),
            RouteError::InvalidMethod { .. }
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<RouteDefinition, _> =
            serde_json::from_str(r#"{"path": "/", "colour": "blue"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_subdomain_forms() {
        let one: RouteDefinition =
            serde_json::from_str(r#"{"path": "/", "subdomain": "admin"}"#).unwrap();
        assert_eq!(one.subdomain, Some(Subdomain::One("admin".into())));

        let many: RouteDefinition =
            serde_json::from_str(r#"{"path": "/", "subdomain": ["a", "b"]}"#).unwrap();
        assert_eq!(
            many.subdomain,
            Some(Subdomain::Many(vec!["a".into(), "b".into()]))
        );
    }
}
