//! View models and handler results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::response::Response;

/// Renderer-agnostic payload produced by a handler.
///
/// `template` and `format` may be left empty by the handler; dispatch fills
/// them before rendering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewModel {
    /// Arbitrary structured data.
    pub data: Value,
    /// Template identifier.
    pub template: Option<String>,
    /// Output format token or MIME type.
    pub format: Option<String>,
    /// Opaque options passed to the renderer.
    #[serde(default)]
    pub renderer_args: Map<String, Value>,
}

impl ViewModel {
    /// Creates a view model around data.
    #[must_use]
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Sets the template.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Sets the format.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Adds a renderer argument.
    #[must_use]
    pub fn with_renderer_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.renderer_args.insert(key.into(), value.into());
        self
    }

    /// The format, or `default` when unset.
    #[must_use]
    pub fn format_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.format.as_deref().unwrap_or(default)
    }
}

/// What a handler returned.
///
/// Built mostly through `From` conversions:
///
/// ```
/// use vitruvius_core::{ActionResult, ViewModel};
/// use serde_json::json;
///
/// assert!(matches!(ActionResult::from("Hello"), ActionResult::Content(_)));
/// assert!(matches!(ActionResult::from(json!({"a": 1})), ActionResult::Data(_)));
/// assert!(matches!(ActionResult::from(ViewModel::default()), ActionResult::View(_)));
/// ```
#[derive(Debug, Clone)]
pub enum ActionResult {
    /// A scalar (string, number, boolean), exposed as `{"content": value}`.
    Content(Value),
    /// Structured data used as the view model data.
    Data(Value),
    /// A pre-built view model.
    View(ViewModel),
    /// A complete response that skips rendering.
    Response(Response),
    /// No result.
    Empty,
}

impl ActionResult {
    /// Forces a template and/or format onto the result.
    ///
    /// Scalars and data become view models; responses and empty results
    /// pass through unchanged.
    #[must_use]
    pub fn with_view(self, template: Option<&str>, format: Option<&str>) -> Self {
        let mut model = match self {
            Self::Content(value) => ViewModel::new(content(value)),
            Self::Data(value) => ViewModel::new(value),
            Self::View(model) => model,
            other => return other,
        };
        if let Some(template) = template {
            model.template = Some(template.to_string());
        }
        if let Some(format) = format {
            model.format = Some(format.to_string());
        }
        Self::View(model)
    }

    /// Returns true for [`ActionResult::Response`].
    #[must_use]
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, Self::Response(_))
    }
}

/// Wraps a scalar as `{"content": value}`.
#[must_use]
pub fn content(value: Value) -> Value {
    let mut map = Map::new();
    map.insert("content".to_string(), value);
    Value::Object(map)
}

impl From<Value> for ActionResult {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Object(_) | Value::Array(_) => Self::Data(value),
            scalar => Self::Content(scalar),
        }
    }
}

impl From<&str> for ActionResult {
    fn from(value: &str) -> Self {
        Self::Content(Value::from(value))
    }
}

impl From<String> for ActionResult {
    fn from(value: String) -> Self {
        Self::Content(Value::from(value))
    }
}

impl From<bool> for ActionResult {
    fn from(value: bool) -> Self {
        Self::Content(Value::from(value))
    }
}

impl From<i64> for ActionResult {
    fn from(value: i64) -> Self {
        Self::Content(Value::from(value))
    }
}

impl From<f64> for ActionResult {
    fn from(value: f64) -> Self {
        Self::Content(Value::from(value))
    }
}

impl From<ViewModel> for ActionResult {
    fn from(model: ViewModel) -> Self {
        Self::View(model)
    }
}

impl From<Response> for ActionResult {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl<T: Into<ActionResult>> From<Option<T>> for ActionResult {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_classification() {
        assert!(matches!(ActionResult::from(Value::Null), ActionResult::Empty));
        assert!(matches!(ActionResult::from(json!(3)), ActionResult::Content(_)));
        assert!(matches!(ActionResult::from(json!([1, 2])), ActionResult::Data(_)));
        assert!(matches!(ActionResult::from(None::<String>), ActionResult::Empty));
    }

    #[test]
    fn test_with_view_wraps_content() {
        let result = ActionResult::from("hi").with_view(Some("custom"), Some("json"));
        let ActionResult::View(model) = result else {
            panic!("expected a view model");
        };
        assert_eq!(model.data, json!({"content": "hi"}));
        assert_eq!(model.template.as_deref(), Some("custom"));
        assert_eq!(model.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_with_view_keeps_existing_fields() {
        let model = ViewModel::new(json!({"a": 1})).with_template("kept");
        let ActionResult::View(model) = ActionResult::from(model).with_view(None, Some("xml")) else {
            panic!("expected a view model");
        };
        assert_eq!(model.template.as_deref(), Some("kept"));
        assert_eq!(model.format_or("html"), "xml");
    }

    #[test]
    fn test_with_view_leaves_responses() {
        let result = ActionResult::from(Response::default()).with_view(Some("x"), None);
        assert!(result.is_short_circuit());
    }
}
