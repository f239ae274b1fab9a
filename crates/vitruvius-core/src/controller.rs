//! Controllers: the handlers a route's `handler` option resolves to.
//!
//! A [`Controller`] is registered in the [`Container`](crate::Container) as
//! an `Arc<dyn Controller>` under the id a route names. Dispatch calls
//! [`Controller::execute`] with the matched parameters and derives the
//! default template from [`Controller::execute_path`].
//!
//! Two ready-made shapes are provided:
//!
//! - [`ActionController`] picks an action from the `action` parameter
//! - [`RestController`] picks an action from the request method

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::{Method, StatusCode};
use indexmap::IndexMap;
use vitruvius_router::Params;

use crate::context::RequestContext;
use crate::error::AppError;
use crate::view::ActionResult;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result returned by controller actions.
///
/// Any error type may be returned; dispatch classifies it, keeping an
/// [`AppError`] as-is and wrapping everything else as an internal error.
pub type HandlerResult = Result<ActionResult, anyhow::Error>;

/// A single controller action.
pub type ActionFn = Arc<
    dyn for<'a> Fn(&'a mut RequestContext, &'a Params) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync,
>;

/// Request handler resolved from the container by route handler id.
///
/// # Example
///
/// ```
/// use vitruvius_core::{ActionResult, BoxFuture, Controller, HandlerResult, RequestContext};
/// use vitruvius_router::Params;
///
/// struct Hello;
///
/// impl Controller for Hello {
///     fn name(&self) -> &str {
///         "hello"
///     }
///
///     fn execute<'a>(
///         &'a self,
///         _ctx: &'a mut RequestContext,
///         params: &'a Params,
///     ) -> BoxFuture<'a, HandlerResult> {
///         Box::pin(async move {
///             let who = params.get("name").unwrap_or("world");
///             Ok(ActionResult::from(format!("Hello {who}")))
///         })
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// Controller name, used for logging and template paths.
    fn name(&self) -> &str;

    /// Runs the controller with the matched route parameters.
    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        params: &'a Params,
    ) -> BoxFuture<'a, HandlerResult>;

    /// Template path segments, joined with `/` to name the default template.
    ///
    /// Defaults to `[name, "index"]`, lowercased.
    fn execute_path(&self, _ctx: &RequestContext, _params: &Params) -> Vec<String> {
        vec![self.name().to_lowercase(), "index".to_string()]
    }
}

/// A controller with named actions, selected by the `action` parameter.
///
/// The action defaults to `index`; hyphens are read as underscores so
/// `/users/reset-password` reaches `reset_password`.
///
/// # Example
///
/// ```
/// use vitruvius_core::{ActionController, ActionResult};
///
/// let users = ActionController::new("Users")
///     .action("index", |_ctx, _params| Box::pin(async { Ok(ActionResult::from("all users")) }))
///     .action("reset_password", |_ctx, _params| Box::pin(async { Ok(ActionResult::Empty) }));
///
/// assert!(users.has_action("reset_password"));
/// ```
pub struct ActionController {
    name: String,
    actions: IndexMap<String, ActionFn>,
}

impl ActionController {
    /// Creates a controller with no actions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: IndexMap::new(),
        }
    }

    /// Registers an action.
    #[must_use]
    pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, &'a Params) -> BoxFuture<'a, HandlerResult>
            + Send
            + Sync
            + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    /// Returns true if an action is registered.
    #[must_use]
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Resolves the action name from route parameters.
    #[must_use]
    pub fn action_name(params: &Params) -> String {
        params.get("action").unwrap_or("index").replace('-', "_")
    }
}

impl Controller for ActionController {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        params: &'a Params,
    ) -> BoxFuture<'a, HandlerResult> {
        let action = Self::action_name(params);
        match self.actions.get(&action) {
            Some(handler) => handler(ctx, params),
            None => {
                let message = format!(
                    "Action '{action}' is not defined on controller '{}'",
                    self.name
                );
                Box::pin(async move { Err(anyhow::Error::from(AppError::internal(message))) })
            }
        }
    }

    fn execute_path(&self, _ctx: &RequestContext, params: &Params) -> Vec<String> {
        vec![self.name.to_lowercase(), Self::action_name(params)]
    }
}

impl fmt::Debug for ActionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionController")
            .field("name", &self.name)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A controller with one action per HTTP method.
///
/// Requests using a method without an action fail with 405.
pub struct RestController {
    name: String,
    methods: HashMap<Method, ActionFn>,
}

impl RestController {
    /// Creates a controller with no methods.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    /// Registers the action for a method.
    #[must_use]
    pub fn method<F>(mut self, method: Method, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, &'a Params) -> BoxFuture<'a, HandlerResult>
            + Send
            + Sync
            + 'static,
    {
        self.methods.insert(method, Arc::new(action));
        self
    }

    /// Registers the `GET` action.
    #[must_use]
    pub fn get<F>(self, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, &'a Params) -> BoxFuture<'a, HandlerResult>
            + Send
            + Sync
            + 'static,
    {
        self.method(Method::GET, action)
    }

    /// Registers the `POST` action.
    #[must_use]
    pub fn post<F>(self, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, &'a Params) -> BoxFuture<'a, HandlerResult>
            + Send
            + Sync
            + 'static,
    {
        self.method(Method::POST, action)
    }

    /// Registers the `PUT` action.
    #[must_use]
    pub fn put<F>(self, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, &'a Params) -> BoxFuture<'a, HandlerResult>
            + Send
            + Sync
            + 'static,
    {
        self.method(Method::PUT, action)
    }

    /// Registers the `DELETE` action.
    #[must_use]
    pub fn delete<F>(self, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, &'a Params) -> BoxFuture<'a, HandlerResult>
            + Send
            + Sync
            + 'static,
    {
        self.method(Method::DELETE, action)
    }
}

impl Controller for RestController {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        params: &'a Params,
    ) -> BoxFuture<'a, HandlerResult> {
        match self.methods.get(ctx.request().method()) {
            Some(handler) => handler(ctx, params),
            None => Box::pin(async {
                let err = AppError::application("Method Not Allowed", StatusCode::METHOD_NOT_ALLOWED);
                Err(anyhow::Error::from(err))
            }),
        }
    }

    fn execute_path(&self, ctx: &RequestContext, _params: &Params) -> Vec<String> {
        vec![
            self.name.to_lowercase(),
            ctx.request().method().as_str().to_lowercase(),
        ]
    }
}

impl fmt::Debug for RestController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestController")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}
