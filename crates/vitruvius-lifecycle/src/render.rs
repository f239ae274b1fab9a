//! Renderers turn a view model into response bytes.
//!
//! Renderers are container services; the render stage looks them up by the
//! names in the `views.renderers` configuration table.

use bytes::Bytes;
use serde_json::Value;
use vitruvius_core::{AppError, AppResult, RequestContext, ViewModel};

/// Container name of the built-in [`JsonRenderer`].
pub const JSON_RENDERER: &str = "json_renderer";

/// Container name of the built-in [`TextRenderer`].
pub const TEXT_RENDERER: &str = "text_renderer";

/// Produces a response body from a view model.
pub trait Renderer: Send + Sync + 'static {
    /// Renderer name for logging.
    fn name(&self) -> &str;

    /// Renders the view model.
    ///
    /// # Errors
    ///
    /// Returns a render failure when the template is unknown or the data
    /// cannot be encoded.
    fn render(&self, view_model: &ViewModel, ctx: &RequestContext) -> AppResult<Bytes>;
}

/// Serializes the view model data as JSON.
///
/// Setting the renderer argument `pretty` to `true` indents the output.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        JSON_RENDERER
    }

    fn render(&self, view_model: &ViewModel, _ctx: &RequestContext) -> AppResult<Bytes> {
        let pretty = view_model
            .renderer_args
            .get("pretty")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let encoded = if pretty {
            serde_json::to_vec_pretty(&view_model.data)
        } else {
            serde_json::to_vec(&view_model.data)
        };
        encoded
            .map(Bytes::from)
            .map_err(|e| AppError::render_with_source("Could not encode view data as JSON", e))
    }
}

/// Renders plain text.
///
/// A `content` string (or a bare string) is written as-is; anything else is
/// written as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn name(&self) -> &str {
        TEXT_RENDERER
    }

    fn render(&self, view_model: &ViewModel, _ctx: &RequestContext) -> AppResult<Bytes> {
        let text = match &view_model.data {
            Value::String(s) => s.clone(),
            Value::Object(map) => match map.get("content") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => view_model.data.to_string(),
            },
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(Bytes::from(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use vitruvius_core::{Container, Request};
    use vitruvius_router::Router;

    fn ctx() -> RequestContext {
        RequestContext::new(
            Request::new(http::Method::GET, http::Uri::from_static("/")),
            Arc::new(Router::new()),
            Arc::new(Container::new()),
        )
    }

    #[test]
    fn test_json_renderer() {
        let model = ViewModel::new(json!({"content": "Hello"}));
        let body = JsonRenderer.render(&model, &ctx()).unwrap();
        assert_eq!(body.as_ref(), br#"{"content":"Hello"}"#);

        let pretty = model.with_renderer_arg("pretty", true);
        let body = JsonRenderer.render(&pretty, &ctx()).unwrap();
        assert!(std::str::from_utf8(&body).unwrap().contains('\n'));
    }

    #[test]
    fn test_text_renderer() {
        let ctx = ctx();
        let body = TextRenderer
            .render(&ViewModel::new(json!({"content": "Hello"})), &ctx)
            .unwrap();
        assert_eq!(body.as_ref(), b"Hello");

        let body = TextRenderer
            .render(&ViewModel::new(json!({"content": 42})), &ctx)
            .unwrap();
        assert_eq!(body.as_ref(), b"42");

        let body = TextRenderer.render(&ViewModel::new(json!([1, 2])), &ctx).unwrap();
        assert_eq!(body.as_ref(), b"[1,2]");
    }
}
