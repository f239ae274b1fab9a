use vitruvius_config::{DebugConfig, LoggingConfig, ViewsConfig};
use vitruvius_core::{AppError, AppResult, BoxFuture, RequestContext, ViewModel, VERSION};
use vitruvius_router::mime;

use crate::event::{Event, Outcome};
use crate::listener::Listener;

/// Template used when neither the status nor `"500"` has one configured.
pub const FALLBACK_ERROR_TEMPLATE: &str = "errors/500";

/// Turns the context's pending error into an error view model.
///
/// The error is logged (at debug level for ignored statuses), the response
/// status is set from the error, and the error report becomes the view data.
#[derive(Debug, Clone)]
pub struct ExceptionListener {
    debug: bool,
    ignore_status: Vec<u16>,
    views: ViewsConfig,
}

impl ExceptionListener {
    /// Creates the listener.
    #[must_use]
    pub fn new(debug: &DebugConfig, logging: &LoggingConfig, views: ViewsConfig) -> Self {
        Self {
            debug: debug.enabled,
            ignore_status: logging.ignore_status.clone(),
            views,
        }
    }

    fn log(&self, ctx: &RequestContext, error: &AppError) {
        let status = error.status_code().as_u16();
        let request_id = ctx.request().id();
        if self.ignore_status.contains(&status) {
            tracing::debug!(
                request_id = %request_id,
                status,
                kind = error.kind().as_str(),
                "{error}"
            );
        } else {
            tracing::error!(
                request_id = %request_id,
                status,
                kind = error.kind().as_str(),
                frames = ?error.cause_chain(),
                "{error}"
            );
        }
    }

    fn template(&self, status: u16) -> String {
        self.views
            .template(&status.to_string())
            .or_else(|| self.views.template("500"))
            .unwrap_or(FALLBACK_ERROR_TEMPLATE)
            .to_string()
    }

    /// Route `format` param, then the `Accept` header, then the default format.
    fn format(&self, ctx: &RequestContext) -> String {
        if let Some(format) = ctx.params().and_then(|params| params.get("format")) {
            return format.to_string();
        }
        ctx.request()
            .accept()
            .and_then(mime::negotiate)
            .unwrap_or(self.views.default_format.as_str())
            .to_string()
    }
}

impl Listener for ExceptionListener {
    fn name(&self) -> &str {
        "exception"
    }

    fn handle<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, AppResult<Option<Outcome>>> {
        Box::pin(async move {
            let ctx = event.context_mut();
            let Some(error) = ctx.exception() else {
                return Ok(None);
            };
            self.log(ctx, error);

            let status = error.status_code();
            let report = error.report(self.debug, VERSION);
            let data = serde_json::to_value(&report).map_err(|e| {
                AppError::render_with_source("Could not encode error report", e)
            })?;
            let model = ViewModel::new(data)
                .with_template(self.template(status.as_u16()))
                .with_format(self.format(ctx));

            ctx.response_mut().set_status(status);
            Ok(Some(Outcome::View(model)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use std::sync::Arc;
    use vitruvius_core::{Container, Request};
    use vitruvius_router::Router;

    fn event(request: Request, error: AppError) -> Event {
        let mut ctx = RequestContext::new(request, Arc::new(Router::new()), Arc::new(Container::new()));
        ctx.set_exception(error);
        Event::new(ctx)
    }

    fn get(path: &'static str) -> Request {
        Request::new(http::Method::GET, http::Uri::from_static(path))
    }

    fn listener(debug: bool) -> ExceptionListener {
        ExceptionListener::new(
            &DebugConfig { enabled: debug },
            &LoggingConfig::default(),
            ViewsConfig::default(),
        )
    }

    fn view(outcome: Option<Outcome>) -> ViewModel {
        match outcome {
            Some(Outcome::View(model)) => model,
            other => panic!("expected a view model, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_not_found_uses_status_template() {
        let mut event = event(get("/missing"), AppError::not_found("Route not found"));

        let model = view(listener(false).handle(&mut event).await.unwrap());
        assert_eq!(model.template.as_deref(), Some("errors/404"));
        assert_eq!(model.format.as_deref(), Some("html"));
        assert_eq!(model.data["code"], 404);
        assert_eq!(event.context().response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_debug_report_exposes_cause() {
        let error = AppError::internal_with_source(
            "An error occurred executing controller: home",
            anyhow::anyhow!("database unavailable"),
        );
        let mut event = event(get("/"), error);

        let model = view(listener(true).handle(&mut event).await.unwrap());
        assert_eq!(model.template.as_deref(), Some("errors/500"));
        assert_eq!(model.data["code"], 500);
        assert_eq!(model.data["message"], "An error occurred executing controller: home");
        assert_eq!(model.data["cause_message"], "database unavailable");
        assert_eq!(model.data["debug"], true);
    }

    #[tokio::test]
    async fn test_production_report_is_generic() {
        let error = AppError::internal_with_source("secret detail", anyhow::anyhow!("password=1"));
        let mut event = event(get("/"), error);

        let model = view(listener(false).handle(&mut event).await.unwrap());
        assert_eq!(model.data["message"], "Internal Server Error");
        assert!(!model.data.to_string().contains("password"));
    }

    #[tokio::test]
    async fn test_unknown_status_falls_back_to_500_template() {
        let mut event = event(
            get("/"),
            AppError::application("Invalid input", StatusCode::BAD_REQUEST),
        );

        let model = view(listener(true).handle(&mut event).await.unwrap());
        assert_eq!(model.template.as_deref(), Some("errors/500"));
        assert_eq!(event.context().response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_format_negotiated_from_accept() {
        let request = get("/").with_header(
            http::header::ACCEPT,
            http::HeaderValue::from_static("application/json"),
        );
        let mut event = event(request, AppError::internal("boom"));

        let model = view(listener(false).handle(&mut event).await.unwrap());
        assert_eq!(model.format.as_deref(), Some("json"));
    }

    #[tokio::test]
    async fn test_no_pending_error() {
        let mut event = Event::new(RequestContext::new(
            get("/"),
            Arc::new(Router::new()),
            Arc::new(Container::new()),
        ));
        assert!(listener(false).handle(&mut event).await.unwrap().is_none());
    }

    #[test]
    fn test_template_chain() {
        let mut views = ViewsConfig::default();
        views.templates.clear();
        let listener = ExceptionListener::new(&DebugConfig::default(), &LoggingConfig::default(), views);
        assert_eq!(listener.template(503), FALLBACK_ERROR_TEMPLATE);
    }
}
