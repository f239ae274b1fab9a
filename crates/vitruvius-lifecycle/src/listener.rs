//! Listener trait and closure adapter.

use std::fmt;

use vitruvius_core::{AppResult, BoxFuture};

use crate::event::{Event, Outcome};

/// Callable registered on a lifecycle stage.
///
/// Returning `Ok(None)` leaves the stage result to later listeners; an error
/// aborts the trigger and moves the lifecycle to the exception stage.
pub trait Listener: Send + Sync + 'static {
    /// Listener name for logging.
    fn name(&self) -> &str;

    /// Handles the event.
    fn handle<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, AppResult<Option<Outcome>>>;
}

/// A listener backed by a closure.
///
/// # Example
///
/// ```
/// use vitruvius_lifecycle::FnListener;
///
/// let audit = FnListener::new("audit", |event| {
///     Box::pin(async move {
///         tracing::info!(path = event.context().request().path(), "completed");
///         Ok(None)
///     })
/// });
/// ```
pub struct FnListener<F> {
    name: String,
    func: F,
}

impl<F> FnListener<F> {
    /// Wraps a closure.
    #[must_use]
    pub fn new(name: impl Into<String>, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut Event) -> BoxFuture<'a, AppResult<Option<Outcome>>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Listener for FnListener<F>
where
    F: for<'a> Fn(&'a mut Event) -> BoxFuture<'a, AppResult<Option<Outcome>>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, AppResult<Option<Outcome>>> {
        (self.func)(event)
    }
}

impl<F> fmt::Debug for FnListener<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener").field("name", &self.name).finish()
    }
}
