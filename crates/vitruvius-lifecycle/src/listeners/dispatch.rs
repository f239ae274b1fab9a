use std::sync::Arc;

use vitruvius_config::ViewsConfig;
use vitruvius_core::{
    content, ActionResult, AppError, AppResult, BoxFuture, Controller, RequestContext, ViewModel,
};
use vitruvius_router::{Params, RouteMatch};

use crate::event::{Event, Outcome};
use crate::listener::Listener;

/// Resolves the matched route's handler from the container and executes it.
///
/// The handler result is normalized into a [`ViewModel`] with its template
/// and format filled in, or into a short-circuit response. Session changes
/// are written to the response cookie after every successful execution.
#[derive(Debug, Clone)]
pub struct DispatchExecuteListener {
    views: ViewsConfig,
}

impl DispatchExecuteListener {
    /// Creates the listener with view settings.
    #[must_use]
    pub fn new(views: ViewsConfig) -> Self {
        Self { views }
    }

    fn resolve(ctx: &RequestContext, route_match: &RouteMatch) -> AppResult<Arc<dyn Controller>> {
        let route = route_match.name();
        let handler = route_match
            .handler()
            .ok_or_else(|| AppError::internal(format!("Controller not found for route: {route}")))?;
        ctx.container()
            .get::<Arc<dyn Controller>>(handler)
            .map_err(|e| {
                AppError::internal_with_source(format!("Controller not found for route: {route}"), e)
            })
    }

    /// Derived template: override table entry for the controller path, or the path itself.
    fn template(&self, path: &[String]) -> String {
        let derived = path.join("/");
        self.views
            .template(&derived)
            .map_or(derived, str::to_string)
    }

    fn normalize(
        &self,
        controller: &dyn Controller,
        ctx: &RequestContext,
        params: &Params,
        result: ActionResult,
    ) -> AppResult<ViewModel> {
        let mut model = match result {
            ActionResult::Content(value) => ViewModel::new(content(value)),
            ActionResult::Data(value) => ViewModel::new(value),
            ActionResult::View(model) => model,
            ActionResult::Response(_) | ActionResult::Empty => {
                return Err(AppError::internal(format!(
                    "The controller {} did not return any data",
                    controller.name()
                )))
            }
        };

        let path = controller.execute_path(ctx, params);
        model.template = Some(match model.template.take() {
            Some(own) => match path.split_last() {
                Some((_, parent)) if !parent.is_empty() => format!("{}/{own}", parent.join("/")),
                _ => own,
            },
            None => self.template(&path),
        });

        if model.format.is_none() {
            let format = params.get("format").unwrap_or(self.views.default_format.as_str());
            model.format = Some(format.to_string());
        }

        Ok(model)
    }
}

impl Listener for DispatchExecuteListener {
    fn name(&self) -> &str {
        "dispatch_execute"
    }

    fn handle<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, AppResult<Option<Outcome>>> {
        Box::pin(async move {
            let ctx = event.context_mut();
            let route_match = ctx
                .route_match()
                .cloned()
                .ok_or_else(|| AppError::internal("Dispatch triggered before a route matched"))?;
            let controller = Self::resolve(ctx, &route_match)?;
            let params = route_match.params;

            tracing::debug!(
                route = route_match.route.name(),
                controller = controller.name(),
                "executing controller"
            );

            let result = controller.execute(ctx, &params).await.map_err(|e| {
                AppError::classify(
                    e,
                    format!("An error occurred executing controller: {}", controller.name()),
                )
            })?;

            if let ActionResult::Response(response) = result {
                ctx.set_response(response);
                ctx.session_to_cookie();
                return Ok(Some(Outcome::ShortCircuit));
            }

            let model = self.normalize(controller.as_ref(), ctx, &params, result)?;
            ctx.session_to_cookie();
            Ok(Some(Outcome::View(model)))
        })
    }
}
