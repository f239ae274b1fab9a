//! The application: router, container, configuration and the lifecycle loop.
//!
//! [`Application::handle`] drives one request through the stages:
//!
//! ```text
//! route.match ──ok──▶ dispatch.execute ──view──▶ render.view ──▶ complete
//!      │                   │      └──response───────────────────▶ complete
//!      └──error──▶ exception ◀──error──┘          │ error
//!                     │  ◀───────────────────────┘
//!                     └──view──▶ render.view ──▶ complete
//! ```
//!
//! A failure while rendering the error page, or inside the exception stage
//! itself, produces a minimal `text/plain` response with the error status.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use tracing::Instrument;
use vitruvius_config::VitruviusConfig;
use vitruvius_core::{
    AppError, AppResult, Container, Controller, Request, RequestContext, Response, SessionStore,
};
use vitruvius_router::{RouteResult, RouteTable, Router};
use vitruvius_telemetry::{
    init_telemetry, record_request, record_stage_error, LogConfig, MetricsConfig, TelemetryConfig,
    TelemetryResult, UNMATCHED_ROUTE,
};

use crate::dispatcher::{EventDispatcher, DEFAULT_PRIORITY};
use crate::event::{Event, Outcome};
use crate::listener::Listener;
use crate::listeners::{DispatchExecuteListener, ExceptionListener, RenderListener, RouteListener};
use crate::render::{JsonRenderer, Renderer, TextRenderer, JSON_RENDERER, TEXT_RENDERER};
use crate::stage::Stage;

/// A configured application ready to handle requests.
///
/// # Example
///
/// ```
/// use vitruvius_core::{ActionController, ActionResult};
/// use vitruvius_lifecycle::Application;
/// use vitruvius_router::Route;
///
/// # tokio_test::block_on(async {
/// let home = ActionController::new("Home")
///     .action("index", |_ctx, _params| Box::pin(async { Ok(ActionResult::from("Hello")) }));
///
/// let app = Application::builder()
///     .route(Route::builder("home", "/").handler("home").build().unwrap())
///     .unwrap()
///     .controller("home", home)
///     .build();
///
/// let request = http::Request::get("/")
///     .header("accept", "application/json")
///     .body(bytes::Bytes::new())
///     .unwrap();
/// let response = app.handle(request).await;
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.body().as_ref(), br#"{"content":"Hello"}"#);
/// # });
/// ```
pub struct Application {
    router: Arc<Router>,
    container: Arc<Container>,
    dispatcher: EventDispatcher,
    config: Arc<VitruviusConfig>,
    session_store: Option<Arc<dyn SessionStore>>,
}

impl Application {
    /// Creates an application builder.
    #[must_use]
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// The router.
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// The service container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &VitruviusConfig {
        &self.config
    }

    /// The event dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Initializes logging and metrics from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a subscriber or recorder is already installed
    /// incompatibly, or the log filter is invalid.
    pub fn init_telemetry(&self) -> TelemetryResult<()> {
        init_telemetry(&telemetry_config(&self.config))
    }

    /// Handles an `http::Request`, returning an `http::Response`.
    pub async fn handle_http(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        self.handle(request).await.into_http()
    }

    /// Runs a request through the lifecycle.
    ///
    /// Never fails: every error ends up as an error response.
    pub async fn handle(&self, request: impl Into<Request>) -> Response {
        let request = request.into();
        let span = tracing::info_span!(
            "request",
            request_id = %request.id(),
            method = %request.method(),
            path = %request.path(),
        );

        async move {
            let ctx = RequestContext::new(request, Arc::clone(&self.router), Arc::clone(&self.container))
                .with_sessions(self.session_store.clone(), self.config.session.settings());
            let mut ctx = self.run(Event::new(ctx)).await.into_context();

            let route = ctx
                .route_match()
                .map_or(UNMATCHED_ROUTE, |m| m.name())
                .to_string();
            let status = ctx.response().status().as_u16();
            let elapsed = ctx.elapsed();
            record_request(&route, status, elapsed);
            tracing::info!(
                route = %route,
                status,
                duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "request completed"
            );

            ctx.take_response()
        }
        .instrument(span)
        .await
    }

    async fn run(&self, mut event: Event) -> Event {
        let mut stage = Stage::RouteMatch;
        let mut handling_exception = false;

        loop {
            stage = match stage {
                Stage::RouteMatch => match self.trigger(&mut event, stage).await {
                    Ok(Some(Outcome::Matched(route_match))) => {
                        event.context_mut().set_route_match(route_match);
                        Stage::DispatchExecute
                    }
                    Ok(Some(Outcome::ShortCircuit)) => Stage::Complete,
                    Ok(_) => {
                        let uri = event.context().request().uri().to_string();
                        let err = AppError::not_found(format!("Route not found for request: {uri}"));
                        Self::fail(&mut event, stage, err)
                    }
                    Err(err) => Self::fail(&mut event, stage, err),
                },

                Stage::DispatchExecute => match self.trigger(&mut event, stage).await {
                    Ok(Some(Outcome::View(model))) => {
                        event.context_mut().set_view_model(model);
                        Stage::Render
                    }
                    Ok(Some(Outcome::ShortCircuit)) => Stage::Complete,
                    Ok(_) => {
                        let err = AppError::internal("Dispatch produced no result");
                        Self::fail(&mut event, stage, err)
                    }
                    Err(err) => Self::fail(&mut event, stage, err),
                },

                Stage::Render => {
                    let failure = match self.trigger(&mut event, stage).await {
                        Ok(Some(Outcome::Rendered(body))) => {
                            event.context_mut().response_mut().set_body(body);
                            None
                        }
                        Ok(Some(Outcome::ShortCircuit)) => None,
                        Ok(_) => Some(AppError::render("No renderer produced output")),
                        Err(err) => Some(err),
                    };
                    match failure {
                        None => Stage::Complete,
                        Some(err) if handling_exception => {
                            record_stage_error(stage.name());
                            tracing::error!(error = %err, "error page could not be rendered");
                            Self::minimal_response(&mut event);
                            Stage::Complete
                        }
                        Some(err) => Self::fail(&mut event, stage, err),
                    }
                }

                Stage::Exception => {
                    handling_exception = true;
                    match self.trigger(&mut event, stage).await {
                        Ok(Some(Outcome::View(model))) => {
                            event.context_mut().set_view_model(model);
                            Stage::Render
                        }
                        Ok(Some(Outcome::ShortCircuit)) => Stage::Complete,
                        Ok(_) => {
                            Self::minimal_response(&mut event);
                            Stage::Complete
                        }
                        Err(err) => {
                            record_stage_error(stage.name());
                            tracing::error!(error = %err, "exception stage failed");
                            Self::minimal_response(&mut event);
                            Stage::Complete
                        }
                    }
                }

                Stage::Complete => {
                    if let Err(err) = self.trigger(&mut event, stage).await {
                        record_stage_error(stage.name());
                        tracing::warn!(error = %err, "complete listener failed");
                    }
                    return event;
                }
            };
        }
    }

    async fn trigger(&self, event: &mut Event, stage: Stage) -> AppResult<Option<Outcome>> {
        event.enter(stage);
        tracing::debug!(stage = stage.name(), "entering stage");
        let result = self.dispatcher.trigger(event).await?;
        Ok(result.outcome)
    }

    /// Records the error on the context and moves to the exception stage.
    fn fail(event: &mut Event, stage: Stage, err: AppError) -> Stage {
        record_stage_error(stage.name());
        tracing::debug!(stage = stage.name(), error = %err, "stage failed");
        event.context_mut().set_exception(err);
        Stage::Exception
    }

    fn minimal_response(event: &mut Event) {
        let ctx = event.context_mut();
        let status = ctx
            .exception()
            .map_or(StatusCode::INTERNAL_SERVER_ERROR, AppError::status_code);
        let reason = status.canonical_reason().unwrap_or("Error");

        let mut response = Response::new(status);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response.set_body(format!("{} {reason}", status.as_u16()));
        ctx.set_response(response);
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("routes", &self.router.len())
            .field("container", &self.container)
            .field("dispatcher", &self.dispatcher)
            .field("sessions", &self.session_store.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Application`].
pub struct ApplicationBuilder {
    router: Router,
    container: Container,
    config: VitruviusConfig,
    session_store: Option<Arc<dyn SessionStore>>,
    listeners: Vec<(Stage, Arc<dyn Listener>, i32, bool)>,
}

impl ApplicationBuilder {
    /// Creates a builder with an empty router and container and default
    /// configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            container: Container::new(),
            config: VitruviusConfig::default(),
            session_store: None,
            listeners: Vec::new(),
        }
    }

    /// Replaces the router.
    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Adds one compiled route.
    ///
    /// # Errors
    ///
    /// Returns an error if the route name is already taken.
    pub fn route(mut self, route: vitruvius_router::Route) -> RouteResult<Self> {
        self.router.add_route(route)?;
        Ok(self)
    }

    /// Compiles and adds every route of a declarative table.
    ///
    /// # Errors
    ///
    /// Returns the first compile or duplicate-name error.
    pub fn routes(mut self, table: &RouteTable) -> RouteResult<Self> {
        for route in table.compile()? {
            self.router.add_route(route)?;
        }
        Ok(self)
    }

    /// Replaces the service container.
    #[must_use]
    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Registers an arbitrary service.
    #[must_use]
    pub fn service<T>(mut self, name: impl Into<String>, service: T) -> Self
    where
        T: std::any::Any + Send + Sync,
    {
        self.container.register(name, service);
        self
    }

    /// Registers a controller under the id routes name as their handler.
    #[must_use]
    pub fn controller(mut self, id: impl Into<String>, controller: impl Controller) -> Self {
        self.container
            .register(id, Arc::new(controller) as Arc<dyn Controller>);
        self
    }

    /// Registers a renderer under the service name used in `views.renderers`.
    #[must_use]
    pub fn renderer(mut self, name: impl Into<String>, renderer: impl Renderer) -> Self {
        self.container
            .register(name, Arc::new(renderer) as Arc<dyn Renderer>);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: VitruviusConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables sessions backed by a store.
    #[must_use]
    pub fn session_store(mut self, store: impl SessionStore) -> Self {
        self.session_store = Some(Arc::new(store));
        self
    }

    /// Adds a listener with an explicit priority. Higher priorities run
    /// first; the built-in listeners use [`DEFAULT_PRIORITY`].
    #[must_use]
    pub fn listener(
        mut self,
        stage: Stage,
        listener: impl Listener,
        priority: i32,
        once_only: bool,
    ) -> Self {
        let listener: Arc<dyn Listener> = Arc::new(listener);
        self.listeners.push((stage, listener, priority, once_only));
        self
    }

    /// Builds the application, registering the built-in listeners and any
    /// built-in renderer the container does not already provide.
    #[must_use]
    pub fn build(self) -> Application {
        let Self {
            router,
            mut container,
            config,
            session_store,
            listeners,
        } = self;

        if !container.contains(JSON_RENDERER) {
            container.register(JSON_RENDERER, Arc::new(JsonRenderer) as Arc<dyn Renderer>);
        }
        if !container.contains(TEXT_RENDERER) {
            container.register(TEXT_RENDERER, Arc::new(TextRenderer) as Arc<dyn Renderer>);
        }

        let mut dispatcher = EventDispatcher::new();
        dispatcher.listen(Stage::RouteMatch, Arc::new(RouteListener));
        dispatcher.listen(
            Stage::DispatchExecute,
            Arc::new(DispatchExecuteListener::new(config.views.clone())),
        );
        dispatcher.listen(
            Stage::Render,
            Arc::new(RenderListener::new(config.views.clone())),
        );
        dispatcher.listen(
            Stage::Exception,
            Arc::new(ExceptionListener::new(
                &config.debug,
                &config.logging,
                config.views.clone(),
            )),
        );
        for (stage, listener, priority, once_only) in listeners {
            dispatcher.add(stage, listener, priority, once_only);
        }

        tracing::debug!(
            routes = router.len(),
            services = container.len(),
            dispatcher = ?dispatcher,
            "application built"
        );

        Application {
            router: Arc::new(router),
            container: Arc::new(container),
            dispatcher,
            config: Arc::new(config),
            session_store,
        }
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("routes", &self.router.len())
            .field("container", &self.container)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Maps the configuration's telemetry section onto the telemetry crate.
#[must_use]
pub fn telemetry_config(config: &VitruviusConfig) -> TelemetryConfig {
    let section = &config.telemetry;
    TelemetryConfig {
        service_name: section.service_name.clone(),
        logging: LogConfig {
            enabled: section.logging.enabled,
            level: section.logging.level.clone(),
            json_format: section.logging.format == vitruvius_config::LogFormat::Json,
            file_line_info: section.logging.include_location,
            service_name: section.service_name.clone(),
            ..LogConfig::default()
        },
        metrics: MetricsConfig {
            enabled: section.metrics.enabled,
        },
    }
}
