//! Lifecycle stages.

use std::fmt;

/// A named point in the request lifecycle with its own listeners.
///
/// Stages run in this order; [`Stage::Exception`] is entered from any of
/// the first three when they fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Stage {
    /// Match the request against the router.
    RouteMatch = 1,
    /// Resolve and execute the matched handler.
    DispatchExecute = 2,
    /// Render the view model into the response body.
    Render = 3,
    /// Turn an error into an error view model.
    Exception = 4,
    /// Cleanup after the response is final.
    Complete = 5,
}

impl Stage {
    /// Returns the event name of this stage.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RouteMatch => "event.mvc.route.match",
            Self::DispatchExecute => "event.mvc.dispatch.execute",
            Self::Render => "event.mvc.render.view",
            Self::Exception => "event.mvc.exception",
            Self::Complete => "event.mvc.complete",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 5] {
        [
            Self::RouteMatch,
            Self::DispatchExecute,
            Self::Render,
            Self::Exception,
            Self::Complete,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
