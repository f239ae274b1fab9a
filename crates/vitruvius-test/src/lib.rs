//! # Vitruvius Test
//!
//! In-memory testing for Vitruvius applications. Requests run through the
//! full lifecycle (routing, dispatch, rendering, exception handling) without
//! binding a port.
//!
//! ## Key Features
//!
//! - **Request Builder**: fluent headers, JSON and form bodies
//! - **Cookie Jar**: session cookies carry over between requests
//! - **Response Assertions**: chainable status, header and body checks
//!
//! ## Example
//!
//! ```
//! use vitruvius_core::{ActionController, ActionResult};
//! use vitruvius_lifecycle::Application;
//! use vitruvius_router::Route;
//! use vitruvius_test::TestClient;
//!
//! # tokio_test::block_on(async {
//! let app = Application::builder()
//!     .route(Route::builder("home", "/").handler("home").build().unwrap())
//!     .unwrap()
//!     .controller(
//!         "home",
//!         ActionController::new("Home").action("index", |_ctx, _params| {
//!             Box::pin(async { Ok(ActionResult::from(serde_json::json!({"id": 7}))) })
//!         }),
//!     )
//!     .build();
//!
//! let client = TestClient::new(app);
//! let response = client.get("/").accept("application/json").send().await;
//! response.assert_status(http::StatusCode::OK);
//!
//! let body: serde_json::Value = response.json().unwrap();
//! assert_eq!(body["id"], 7);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/vitruvius-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
