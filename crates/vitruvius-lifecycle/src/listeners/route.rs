use vitruvius_core::{AppError, AppResult, BoxFuture};

use crate::event::{Event, Outcome};
use crate::listener::Listener;

/// Matches the request against the router, taking the highest-priority match.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteListener;

impl Listener for RouteListener {
    fn name(&self) -> &str {
        "route"
    }

    fn handle<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, AppResult<Option<Outcome>>> {
        Box::pin(async move {
            let ctx = event.context();
            match ctx.router().first_match(ctx.request()) {
                Some(route_match) => {
                    tracing::debug!(
                        route = route_match.name(),
                        params = ?route_match.params,
                        "route matched"
                    );
                    Ok(Some(Outcome::Matched(route_match)))
                }
                None => Err(AppError::not_found(format!(
                    "Route not found for request: {}",
                    ctx.request().uri()
                ))),
            }
        })
    }
}
