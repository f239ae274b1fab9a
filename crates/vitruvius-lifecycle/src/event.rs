//! The event passed to listeners.

use vitruvius_core::{AppResult, RequestContext, Response, ViewModel};
use vitruvius_router::RouteMatch;

use bytes::Bytes;

use crate::stage::Stage;

/// What a listener produced for its stage.
///
/// A stage's result is the first `Some(Outcome)` returned by its listeners;
/// later results are discarded.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The route stage matched a route.
    Matched(RouteMatch),
    /// Dispatch or exception produced a view model to render.
    View(ViewModel),
    /// Dispatch stored a final response in the context; rendering is skipped.
    ShortCircuit,
    /// The render stage produced the response body.
    Rendered(Bytes),
}

/// Event carrying the request context through every stage.
///
/// One event lives for the whole request; the lifecycle updates its stage
/// before each trigger.
///
/// There is no separate per-stage parameter map. State a stage hands to the
/// next (route match, view model, exception, response) lives on the
/// [`RequestContext`].
#[derive(Debug)]
pub struct Event {
    stage: Stage,
    context: RequestContext,
    propagation_stopped: bool,
}

impl Event {
    /// Creates an event for the first stage.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        Self {
            stage: Stage::RouteMatch,
            context,
            propagation_stopped: false,
        }
    }

    /// The stage being triggered.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.propagation_stopped = false;
    }

    /// The request context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Mutable access to the request context.
    pub fn context_mut(&mut self) -> &mut RequestContext {
        &mut self.context
    }

    /// Consumes the event, returning the context.
    #[must_use]
    pub fn into_context(self) -> RequestContext {
        self.context
    }

    /// Skips the remaining listeners of the current trigger.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Returns true once a listener stopped propagation.
    #[must_use]
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Shorthand for a listener that short-circuits with a response.
    pub fn respond(&mut self, response: Response) -> AppResult<Option<Outcome>> {
        self.context.set_response(response);
        Ok(Some(Outcome::ShortCircuit))
    }
}
