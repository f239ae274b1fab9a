//! # Vitruvius
//!
//! **Event-driven MVC request lifecycle with a segment-path router**
//!
//! Vitruvius takes a request through a fixed sequence of stages, each one an
//! event with prioritized listeners:
//!
//! - **Routing**: declarative route tables compile to priority-ordered routes
//!   with parameter constraints, optional segments and reverse assembly
//! - **Dispatch**: the matched route names a controller in the service
//!   container; its result is normalized into a view model
//! - **Rendering**: renderers chosen by format turn view models into bodies
//! - **Exceptions**: every failure is classified and rendered as an error page
//!
//! ## Quick Start
//!
//! ```rust
//! use vitruvius::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let home = ActionController::new("Home")
//!     .action("index", |_ctx, _params| Box::pin(async { Ok(ActionResult::from("Hello")) }));
//!
//! let app = Application::builder()
//!     .route(Route::builder("home", "/").handler("home").build().unwrap())
//!     .unwrap()
//!     .controller("home", home)
//!     .build();
//!
//! let request = Request::new(http::Method::GET, http::Uri::from_static("/"))
//!     .with_header(http::header::ACCEPT, http::HeaderValue::from_static("text/plain"));
//! let response = app.handle(request).await;
//! assert_eq!(response.body().as_ref(), b"Hello");
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → route.match → dispatch.execute → render.view → complete → Response
//!               │                │                │
//!               └────────────────┴────────────────┴──▶ exception → render.view
//! ```

#![doc(html_root_url = "https://docs.rs/vitruvius/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use vitruvius_core as core;

// Re-export router types
pub use vitruvius_router as router;

// Re-export configuration
pub use vitruvius_config as config;

// Re-export telemetry
pub use vitruvius_telemetry as telemetry;

// Re-export the lifecycle
pub use vitruvius_lifecycle as lifecycle;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use vitruvius::prelude::*;
///
/// let route = Route::builder("home", "/").handler("home").build().unwrap();
/// assert_eq!(route.name(), "home");
/// ```
pub mod prelude {
    pub use vitruvius_core::{
        ActionController, ActionResult, AppError, AppResult, Container, Controller, ErrorKind,
        HandlerResult, MemorySessionStore, Request, RequestContext, Response, RestController,
        ViewModel,
    };

    pub use vitruvius_router::{Params, Route, RouteDefinition, RouteTable, Router};

    pub use vitruvius_config::{ConfigLoader, VitruviusConfig};

    pub use vitruvius_telemetry::{init_telemetry, TelemetryConfig};

    pub use vitruvius_lifecycle::{
        Application, ApplicationBuilder, Event, FnListener, Listener, Outcome, Renderer, Stage,
    };
}
