use std::sync::Arc;

use vitruvius_config::ViewsConfig;
use vitruvius_core::{AppError, AppResult, BoxFuture, ViewModel};
use vitruvius_router::mime;

use crate::event::{Event, Outcome};
use crate::listener::Listener;
use crate::render::Renderer;

/// Renders the context's view model with a configured renderer.
///
/// Renderers are tried in order: the one configured for the model's format,
/// the default renderer, then the renderer of the default format. The first
/// that succeeds wins and sets the response content type.
#[derive(Debug, Clone)]
pub struct RenderListener {
    views: ViewsConfig,
}

impl RenderListener {
    /// Creates the listener with view settings.
    #[must_use]
    pub fn new(views: ViewsConfig) -> Self {
        Self { views }
    }

    /// `(format, renderer service)` pairs to try, without repeats.
    fn candidates(&self, format: &str) -> Vec<(String, String)> {
        let views = &self.views;
        let mut candidates: Vec<(String, String)> = Vec::with_capacity(3);
        let mut push = |format: &str, renderer: Option<&str>| {
            if let Some(renderer) = renderer {
                let candidate = (format.to_string(), renderer.to_string());
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        };

        push(format, views.renderer_for(format));
        push(format, views.renderer_for(&views.default_renderer));
        push(
            &views.default_format,
            views.renderer_for(&views.default_format),
        );
        candidates
    }
}

impl Listener for RenderListener {
    fn name(&self) -> &str {
        "render"
    }

    fn handle<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, AppResult<Option<Outcome>>> {
        Box::pin(async move {
            let ctx = event.context_mut();
            let mut model: ViewModel = ctx
                .view_model()
                .cloned()
                .ok_or_else(|| AppError::render("No view model to render"))?;
            let template = model.template.clone().unwrap_or_default();
            let format = model.format_or(&self.views.default_format).to_string();

            let mut last_error: Option<AppError> = None;
            for (candidate_format, service) in self.candidates(&format) {
                let renderer = match ctx.container().get::<Arc<dyn Renderer>>(&service) {
                    Ok(renderer) => renderer,
                    Err(e) => {
                        tracing::debug!(renderer = %service, error = %e, "renderer unavailable");
                        last_error = Some(e.into());
                        continue;
                    }
                };

                model.format = Some(candidate_format.clone());
                match renderer.render(&model, ctx) {
                    Ok(body) => {
                        tracing::debug!(
                            renderer = renderer.name(),
                            template = %template,
                            format = %candidate_format,
                            "view rendered"
                        );
                        ctx.response_mut()
                            .set_default_content_type(&mime::content_type(&candidate_format));
                        ctx.set_view_model(model);
                        return Ok(Some(Outcome::Rendered(body)));
                    }
                    Err(e) => {
                        tracing::debug!(renderer = renderer.name(), error = %e, "renderer failed");
                        last_error = Some(e);
                    }
                }
            }

            let message = format!("Template ({template}) not found");
            Err(match last_error {
                Some(source) => AppError::render_with_source(message, source),
                None => AppError::render(message),
            })
        })
    }
}
