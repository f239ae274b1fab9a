//! Per-request lifecycle context.
//!
//! The [`RequestContext`] is the one mutable structure threaded through every
//! lifecycle stage. It is owned by a single request and never shared.
//!
//! | Key | Written by | Read by |
//! |---|---|---|
//! | `request` | construction | every stage |
//! | `route_match` | route match | dispatch |
//! | `response` | dispatch, exception | render, complete |
//! | `view_model` | dispatch, exception | render |
//! | `exception` | lifecycle | exception |
//!
//! Listeners can stash additional typed state in the extensions map.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::StatusCode;
use indexmap::IndexMap;
use serde_json::Value;
use vitruvius_router::{Params, RouteMatch, Router};

use crate::container::Container;
use crate::controller::{Controller, HandlerResult};
use crate::cookie::SetCookie;
use crate::error::{AppError, AppResult};
use crate::request::Request;
use crate::response::Response;
use crate::session::{Session, SessionSettings, SessionStore};
use crate::view::ViewModel;

/// Session key holding form data preserved across a POST/redirect/GET.
pub const POST_REDIRECT_GET: &str = "post_redirect_get";

/// Session key holding pending flash messages.
pub const FLASH_MESSAGES: &str = "flash_messages";

/// Per-request state shared by all lifecycle stages.
pub struct RequestContext {
    request: Request,
    response: Response,
    route_match: Option<RouteMatch>,
    view_model: Option<ViewModel>,
    exception: Option<AppError>,
    router: Arc<Router>,
    container: Arc<Container>,
    session: Option<Session>,
    session_store: Option<Arc<dyn SessionStore>>,
    session_settings: SessionSettings,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    started: Instant,
}

impl RequestContext {
    /// Creates a context for a request.
    #[must_use]
    pub fn new(request: Request, router: Arc<Router>, container: Arc<Container>) -> Self {
        Self {
            request,
            response: Response::default(),
            route_match: None,
            view_model: None,
            exception: None,
            router,
            container,
            session: None,
            session_store: None,
            session_settings: SessionSettings::default(),
            extensions: HashMap::new(),
            started: Instant::now(),
        }
    }

    /// Attaches a session store and cookie settings.
    #[must_use]
    pub fn with_sessions(
        mut self,
        store: Option<Arc<dyn SessionStore>>,
        settings: SessionSettings,
    ) -> Self {
        self.session_store = store;
        self.session_settings = settings;
        self
    }

    /// The incoming request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The response being built.
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Mutable access to the response.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Replaces the response.
    pub fn set_response(&mut self, response: Response) {
        self.response = response;
    }

    /// Takes the response, leaving a default one.
    pub fn take_response(&mut self) -> Response {
        std::mem::take(&mut self.response)
    }

    /// The matched route, once routing succeeded.
    #[must_use]
    pub fn route_match(&self) -> Option<&RouteMatch> {
        self.route_match.as_ref()
    }

    /// Stores the matched route.
    pub fn set_route_match(&mut self, route_match: RouteMatch) {
        self.route_match = Some(route_match);
    }

    /// Parameters of the matched route.
    #[must_use]
    pub fn params(&self) -> Option<&Params> {
        self.route_match.as_ref().map(|m| &m.params)
    }

    /// The view model to render.
    #[must_use]
    pub fn view_model(&self) -> Option<&ViewModel> {
        self.view_model.as_ref()
    }

    /// Stores the view model to render.
    pub fn set_view_model(&mut self, view_model: ViewModel) {
        self.view_model = Some(view_model);
    }

    /// The error being handled, during the exception stage.
    #[must_use]
    pub fn exception(&self) -> Option<&AppError> {
        self.exception.as_ref()
    }

    /// Stores the error being handled.
    pub fn set_exception(&mut self, exception: AppError) {
        self.exception = Some(exception);
    }

    /// The application router.
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// The service container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Inserts typed extension state, returning any previous value.
    pub fn insert_extension<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.extensions
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Reads typed extension state.
    #[must_use]
    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Mutably reads typed extension state.
    pub fn extension_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// The session if one was started or loaded.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The session, loading it from the store by cookie or starting a new one.
    pub fn session_mut(&mut self) -> &mut Session {
        if self.session.is_none() {
            let restored = self.session_store.as_ref().and_then(|store| {
                let id = self.request.cookie(&self.session_settings.cookie_name)?;
                store.load(id).map(|data| Session::restore(id, data))
            });
            self.session = Some(restored.unwrap_or_default());
        }
        self.session.get_or_insert_with(Session::new)
    }

    /// Persists a modified session and writes its id cookie on the response.
    pub fn session_to_cookie(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_modified() && !(session.is_new() && !session.data().is_empty()) {
            return;
        }
        if let Some(store) = &self.session_store {
            store.save(session.id(), session.data());
        }
        let settings = &self.session_settings;
        let cookie = SetCookie::new(settings.cookie_name.clone(), session.id())
            .path("/")
            .max_age_secs(settings.timeout_secs)
            .http_only(settings.http_only)
            .secure(settings.secure);
        self.response.add_cookie(&cookie);
        session.mark_saved();
        tracing::trace!(session = %session.id(), "session written to cookie");
    }

    /// Assembles the path for a named route.
    pub fn url(&self, route: &str, params: &Params) -> AppResult<String> {
        Ok(self.router.assemble(route, params)?)
    }

    /// Assembles an absolute URL for a named route.
    ///
    /// `host` defaults to the request host and `scheme` to the request scheme
    /// (or `http`).
    pub fn absolute_url(
        &self,
        route: &str,
        params: &Params,
        host: Option<&str>,
        scheme: Option<&str>,
    ) -> AppResult<String> {
        let path = self.url(route, params)?;
        let host = host.or_else(|| self.request.host()).unwrap_or("localhost");
        let scheme = scheme
            .or_else(|| self.request.uri().scheme_str())
            .unwrap_or("http");
        Ok(format!("{scheme}://{host}{path}"))
    }

    /// Builds a redirect response.
    ///
    /// `target` is a route name (assembled with `params`) or a literal path.
    /// For `POST` and `PUT` requests a 302 becomes 303, and the submitted form
    /// is kept in the session for [`redirect_vars`](Self::redirect_vars).
    pub fn redirect(&mut self, target: &str, params: &Params, status: StatusCode) -> AppResult<Response> {
        let location = if self.router.contains(target) {
            self.router.assemble(target, params)?
        } else {
            target.to_string()
        };

        let mut status = status;
        if self.request.is_write() {
            if status == StatusCode::FOUND {
                status = StatusCode::SEE_OTHER;
            }
            let form: serde_json::Map<String, Value> = self
                .request
                .form()
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            self.session_mut().set(POST_REDIRECT_GET, Value::Object(form));
        }

        tracing::debug!(location = %location, status = status.as_u16(), "redirecting");
        Ok(Response::redirect(&location, status))
    }

    /// Form data preserved by the last POST/redirect/GET.
    pub fn redirect_vars(&mut self) -> Option<Value> {
        self.session_mut().get(POST_REDIRECT_GET).cloned()
    }

    /// Forgets preserved form data.
    pub fn clear_redirect_vars(&mut self) {
        self.session_mut().delete(POST_REDIRECT_GET);
    }

    /// Queues a flash message under a namespace. Duplicates are ignored.
    pub fn flash(&mut self, message: impl Into<String>, namespace: &str) {
        let message = message.into();
        let mut messages = self.flash_messages();
        let bucket = messages.entry(namespace.to_string()).or_default();
        if !bucket.contains(&message) {
            bucket.push(message);
        }
        let value = serde_json::to_value(&messages).unwrap_or(Value::Null);
        self.session_mut().set(FLASH_MESSAGES, value);
    }

    /// Pending flash messages, grouped by namespace.
    pub fn flash_messages(&mut self) -> IndexMap<String, Vec<String>> {
        self.session_mut()
            .get(FLASH_MESSAGES)
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    /// Returns and clears pending flash messages.
    pub fn take_flash_messages(&mut self) -> IndexMap<String, Vec<String>> {
        let messages = self.flash_messages();
        if !messages.is_empty() {
            self.session_mut().delete(FLASH_MESSAGES);
        }
        messages
    }

    /// Executes another controller with this context.
    pub async fn forward(&mut self, controller: &dyn Controller, params: &Params) -> HandlerResult {
        tracing::debug!(controller = controller.name(), "forwarding request");
        controller.execute(self, params).await
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request.id())
            .field("path", &self.request.path())
            .field("route", &self.route_match.as_ref().map(RouteMatch::name))
            .field("status", &self.response.status())
            .field("has_view_model", &self.view_model.is_some())
            .field("has_exception", &self.exception.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use http::{HeaderValue, Method, Uri};
    use serde_json::json;
    use vitruvius_router::Route;

    fn router() -> Arc<Router> {
        let mut router = Router::new();
        router
            .add_route(Route::builder("user", "/users/:id").build().unwrap())
            .unwrap();
        Arc::new(router)
    }

    fn context(request: Request) -> RequestContext {
        RequestContext::new(request, router(), Arc::new(Container::new()))
    }

    fn get(uri: &'static str) -> Request {
        Request::new(Method::GET, Uri::from_static(uri))
    }

    #[test]
    fn test_url_and_absolute_url() {
        let ctx = context(get("http://example.com/"));
        let params = Params::from([("id", "7")]);
        assert_eq!(ctx.url("user", &params).unwrap(), "/users/7");
        assert_eq!(
            ctx.absolute_url("user", &params, None, Some("https")).unwrap(),
            "https://example.com/users/7"
        );
        assert!(ctx.url("missing", &params).is_err());
    }

    #[test]
    fn test_redirect_to_route_and_literal() {
        let mut ctx = context(get("/"));
        let response = ctx
            .redirect("user", &Params::from([("id", "1")]), StatusCode::FOUND)
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.header(LOCATION), Some("/users/1"));

        let response = ctx.redirect("/elsewhere", &Params::new(), StatusCode::FOUND).unwrap();
        assert_eq!(response.header(LOCATION), Some("/elsewhere"));
        assert!(ctx.session().is_none());
    }

    #[test]
    fn test_redirect_after_post_preserves_form() {
        let request = Request::new(Method::POST, Uri::from_static("/signup"))
            .with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .with_body("email=a%40b.c");
        let mut ctx = context(request);

        let response = ctx.redirect("/signup", &Params::new(), StatusCode::FOUND).unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(ctx.redirect_vars(), Some(json!({"email": "a@b.c"})));

        ctx.clear_redirect_vars();
        assert_eq!(ctx.redirect_vars(), None);
    }

    #[test]
    fn test_redirect_after_post_keeps_explicit_status() {
        let request = Request::new(Method::POST, Uri::from_static("/signup"))
            .with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .with_body("email=a%40b.c");
        let mut ctx = context(request);

        let response = ctx
            .redirect("/moved", &Params::new(), StatusCode::MOVED_PERMANENTLY)
            .unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.header(LOCATION), Some("/moved"));
        assert_eq!(ctx.redirect_vars(), Some(json!({"email": "a@b.c"})));
    }

    #[test]
    fn test_flash_messages_deduplicate_and_drain() {
        let mut ctx = context(get("/"));
        ctx.flash("Saved", "info");
        ctx.flash("Saved", "info");
        ctx.flash("Careful", "warning");

        let messages = ctx.take_flash_messages();
        assert_eq!(messages["info"], vec!["Saved".to_string()]);
        assert_eq!(messages["warning"], vec!["Careful".to_string()]);
        assert!(ctx.take_flash_messages().is_empty());
    }

    #[test]
    fn test_session_to_cookie_persists() {
        let store = Arc::new(MemorySessionStore::new());
        let mut ctx = context(get("/")).with_sessions(
            Some(store.clone() as Arc<dyn SessionStore>),
            SessionSettings::default(),
        );

        ctx.session_mut().set("user", "alice");
        let id = ctx.session().unwrap().id().to_string();
        ctx.session_to_cookie();

        let cookie = ctx.response().header(SET_COOKIE).unwrap();
        assert!(cookie.starts_with(&format!("vitruvius_session={id}")));
        assert_eq!(store.load(&id).unwrap()["user"], json!("alice"));

        // a second request restores the session from the cookie
        let request = get("/").with_header(
            COOKIE,
            HeaderValue::from_str(&format!("vitruvius_session={id}")).unwrap(),
        );
        let mut next = context(request).with_sessions(
            Some(store as Arc<dyn SessionStore>),
            SessionSettings::default(),
        );
        assert_eq!(next.session_mut().get("user"), Some(&json!("alice")));
        next.session_to_cookie();
        assert!(next.response().header(SET_COOKIE).is_none());
    }

    #[test]
    fn test_unmodified_session_writes_nothing() {
        let mut ctx = context(get("/"));
        let _ = ctx.session_mut();
        ctx.session_to_cookie();
        assert!(ctx.response().header(SET_COOKIE).is_none());
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Marker(u8);

        let mut ctx = context(get("/"));
        assert!(ctx.insert_extension(Marker(1)).is_none());
        assert_eq!(ctx.insert_extension(Marker(2)), Some(Marker(1)));
        ctx.extension_mut::<Marker>().unwrap().0 = 3;
        assert_eq!(ctx.extension::<Marker>(), Some(&Marker(3)));
    }
}
