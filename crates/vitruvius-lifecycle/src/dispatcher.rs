//! Stage listener registry and trigger.
//!
//! Listeners run in descending priority; equal priorities run in
//! registration order. The first non-empty result becomes the stage result,
//! but every listener still runs unless one stops propagation or fails.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use vitruvius_core::AppResult;

use crate::event::{Event, Outcome};
use crate::listener::Listener;
use crate::stage::Stage;

/// Priority used when none is given.
pub const DEFAULT_PRIORITY: i32 = 1;

struct Registration {
    listener: Arc<dyn Listener>,
    priority: i32,
    once_only: bool,
    fired: AtomicBool,
}

/// Result of triggering a stage.
#[derive(Debug, Default)]
pub struct TriggerResult {
    /// First non-empty listener result.
    pub outcome: Option<Outcome>,
    /// Number of listeners invoked.
    pub invoked: usize,
    /// Whether a listener stopped propagation.
    pub stopped: bool,
}

/// Per-stage ordered listener lists.
///
/// Listeners are registered during bootstrap; triggering only reads the
/// registry, so one dispatcher serves concurrent requests.
#[derive(Default)]
pub struct EventDispatcher {
    stages: HashMap<Stage, Vec<Registration>>,
}

impl EventDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener with the default priority, invoked every time.
    pub fn listen(&mut self, stage: Stage, listener: Arc<dyn Listener>) {
        self.add(stage, listener, DEFAULT_PRIORITY, false);
    }

    /// Registers a listener.
    ///
    /// A `once_only` listener is invoked on the first trigger of its stage
    /// and skipped afterwards.
    pub fn add(&mut self, stage: Stage, listener: Arc<dyn Listener>, priority: i32, once_only: bool) {
        tracing::debug!(
            stage = stage.name(),
            listener = listener.name(),
            priority,
            once_only,
            "registering listener"
        );
        let registrations = self.stages.entry(stage).or_default();
        registrations.push(Registration {
            listener,
            priority,
            once_only,
            fired: AtomicBool::new(false),
        });
        // stable: ties keep registration order
        registrations.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Listener names for a stage, in invocation order.
    #[must_use]
    pub fn listeners(&self, stage: Stage) -> Vec<&str> {
        self.stages
            .get(&stage)
            .map(|regs| regs.iter().map(|r| r.listener.name()).collect())
            .unwrap_or_default()
    }

    /// Returns true if the stage has any listener.
    #[must_use]
    pub fn has_listeners(&self, stage: Stage) -> bool {
        self.stages.get(&stage).is_some_and(|regs| !regs.is_empty())
    }

    /// Triggers the event's current stage.
    ///
    /// # Errors
    ///
    /// Returns the first listener error; listeners after it do not run.
    pub async fn trigger(&self, event: &mut Event) -> AppResult<TriggerResult> {
        let stage = event.stage();
        let mut result = TriggerResult::default();
        let Some(registrations) = self.stages.get(&stage) else {
            return Ok(result);
        };

        for registration in registrations {
            if registration.once_only && registration.fired.swap(true, Ordering::AcqRel) {
                continue;
            }

            let name = registration.listener.name();
            tracing::trace!(stage = stage.name(), listener = name, "invoking listener");
            let outcome = registration.listener.handle(event).await?;
            result.invoked += 1;

            if result.outcome.is_none() {
                result.outcome = outcome;
            } else if outcome.is_some() {
                tracing::trace!(stage = stage.name(), listener = name, "later result discarded");
            }

            if event.is_propagation_stopped() {
                tracing::debug!(stage = stage.name(), listener = name, "propagation stopped");
                result.stopped = true;
                break;
            }
        }

        Ok(result)
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for stage in Stage::all() {
            if self.has_listeners(stage) {
                map.entry(&stage.name(), &self.listeners(stage));
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::FnListener;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use vitruvius_core::{AppError, Container, Request, RequestContext, ViewModel};
    use vitruvius_router::Router;

    fn event() -> Event {
        let request = Request::new(http::Method::GET, http::Uri::from_static("/"));
        Event::new(RequestContext::new(
            request,
            Arc::new(Router::new()),
            Arc::new(Container::new()),
        ))
    }

    fn recorder(
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        outcome: Option<&'static str>,
    ) -> Arc<dyn Listener> {
        Arc::new(FnListener::new(name, move |_event| {
            let log = log.clone();
            Box::pin(async move {
                log.lock().push(name);
                Ok(outcome.map(|t| Outcome::View(ViewModel::default().with_template(t))))
            })
        }))
    }

    fn template(result: &TriggerResult) -> Option<&str> {
        match &result.outcome {
            Some(Outcome::View(model)) => model.template.as_deref(),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_priority_then_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add(Stage::RouteMatch, recorder("low", log.clone(), None), -5, false);
        dispatcher.add(Stage::RouteMatch, recorder("first", log.clone(), None), 1, false);
        dispatcher.add(Stage::RouteMatch, recorder("second", log.clone(), None), 1, false);
        dispatcher.add(Stage::RouteMatch, recorder("high", log.clone(), None), 100, false);

        assert_eq!(
            dispatcher.listeners(Stage::RouteMatch),
            vec!["high", "first", "second", "low"]
        );

        let result = dispatcher.trigger(&mut event()).await.unwrap();
        assert_eq!(result.invoked, 4);
        assert_eq!(*log.lock(), vec!["high", "first", "second", "low"]);
    }

    #[tokio::test]
    async fn test_first_non_empty_result_wins() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add(Stage::RouteMatch, recorder("empty", log.clone(), None), 10, false);
        dispatcher.add(Stage::RouteMatch, recorder("winner", log.clone(), Some("a")), 5, false);
        dispatcher.add(Stage::RouteMatch, recorder("ignored", log.clone(), Some("b")), 1, false);

        let result = dispatcher.trigger(&mut event()).await.unwrap();
        assert_eq!(template(&result), Some("a"));
        assert_eq!(log.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_once_only_listener_fires_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add(Stage::Complete, recorder("once", log.clone(), None), 1, true);
        dispatcher.add(Stage::Complete, recorder("always", log.clone(), None), 1, false);

        let mut event = event();
        event.enter(Stage::Complete);
        dispatcher.trigger(&mut event).await.unwrap();
        let second = dispatcher.trigger(&mut event).await.unwrap();

        assert_eq!(second.invoked, 1);
        assert_eq!(*log.lock(), vec!["once", "always", "always"]);
    }

    #[tokio::test]
    async fn test_stop_propagation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        let stopper: Arc<dyn Listener> = Arc::new(FnListener::new("stopper", |event| {
            Box::pin(async move {
                event.stop_propagation();
                Ok(None)
            })
        }));
        dispatcher.add(Stage::RouteMatch, stopper, 10, false);
        dispatcher.add(Stage::RouteMatch, recorder("skipped", log.clone(), None), 1, false);

        let mut event = event();
        let result = dispatcher.trigger(&mut event).await.unwrap();
        assert!(result.stopped);
        assert_eq!(result.invoked, 1);
        assert!(log.lock().is_empty());

        // a new trigger starts with propagation enabled again
        event.enter(Stage::RouteMatch);
        assert!(!event.is_propagation_stopped());
    }

    #[tokio::test]
    async fn test_error_aborts_trigger() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        let failing: Arc<dyn Listener> = Arc::new(FnListener::new("failing", |_event| {
            Box::pin(async { Err(AppError::internal("boom")) })
        }));
        dispatcher.add(Stage::RouteMatch, failing, 10, false);
        dispatcher.add(Stage::RouteMatch, recorder("after", log.clone(), None), 1, false);

        let err = dispatcher.trigger(&mut event()).await.unwrap_err();
        assert_eq!(err.message(), "boom");
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stage_without_listeners() {
        let dispatcher = EventDispatcher::new();
        let result = dispatcher.trigger(&mut event()).await.unwrap();
        assert!(result.outcome.is_none());
        assert_eq!(result.invoked, 0);
        assert!(!dispatcher.has_listeners(Stage::Render));
    }
}
