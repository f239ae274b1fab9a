//! Event-driven request lifecycle for Vitruvius.
//!
//! Every request runs through named stages. Each stage triggers the
//! listeners registered on it, highest priority first; the first listener
//! that returns an [`Outcome`] decides the stage result.
//!
//! | Stage | Event name | Built-in listener |
//! |---|---|---|
//! | [`Stage::RouteMatch`] | `event.mvc.route.match` | [`RouteListener`] |
//! | [`Stage::DispatchExecute`] | `event.mvc.dispatch.execute` | [`DispatchExecuteListener`] |
//! | [`Stage::Render`] | `event.mvc.render.view` | [`RenderListener`] |
//! | [`Stage::Exception`] | `event.mvc.exception` | [`ExceptionListener`] |
//! | [`Stage::Complete`] | `event.mvc.complete` | none |
//!
//! # Example
//!
//! ```
//! use vitruvius_core::{ActionController, ActionResult};
//! use vitruvius_lifecycle::{Application, FnListener, Stage};
//! use vitruvius_router::Route;
//!
//! # tokio_test::block_on(async {
//! let app = Application::builder()
//!     .route(Route::builder("home", "/").handler("home").build().unwrap())
//!     .unwrap()
//!     .controller(
//!         "home",
//!         ActionController::new("Home")
//!             .action("index", |_ctx, _params| Box::pin(async { Ok(ActionResult::from("Hi")) })),
//!     )
//!     .listener(
//!         Stage::Complete,
//!         FnListener::new("audit", |event| {
//!             Box::pin(async move {
//!                 tracing::info!(status = event.context().response().status().as_u16(), "done");
//!                 Ok(None)
//!             })
//!         }),
//!         0,
//!         false,
//!     )
//!     .build();
//!
//! let response = app.handle(http::Request::get("/").body(bytes::Bytes::new()).unwrap()).await;
//! assert_eq!(response.status(), http::StatusCode::OK);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/vitruvius-lifecycle/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod application;
mod dispatcher;
mod event;
mod listener;
pub mod listeners;
pub mod render;
mod stage;

pub use application::{telemetry_config, Application, ApplicationBuilder};
pub use dispatcher::{EventDispatcher, TriggerResult, DEFAULT_PRIORITY};
pub use event::{Event, Outcome};
pub use listener::{FnListener, Listener};
pub use listeners::{DispatchExecuteListener, ExceptionListener, RenderListener, RouteListener};
pub use render::{JsonRenderer, Renderer, TextRenderer, JSON_RENDERER, TEXT_RENDERER};
pub use stage::Stage;
