//! # Vitruvius Core
//!
//! Core types shared by every stage of the Vitruvius request lifecycle.
//!
//! This crate provides:
//!
//! - [`Request`] and [`Response`] - Parsed request and response under construction
//! - [`RequestContext`] - Mutable per-request state passed between stages
//! - [`Controller`] - Handler trait, with [`ActionController`] and [`RestController`]
//! - [`ViewModel`] and [`ActionResult`] - What handlers produce and renderers consume
//! - [`AppError`] - Classified lifecycle errors
//! - [`Container`] - Named service lookup
//! - [`Session`] and [`SessionStore`] - Cookie-backed sessions

#![doc(html_root_url = "https://docs.rs/vitruvius-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod container;
mod context;
mod controller;
pub mod cookie;
mod error;
mod request;
mod response;
pub mod session;
mod view;

pub use container::{Container, ContainerError};
pub use context::{RequestContext, FLASH_MESSAGES, POST_REDIRECT_GET};
pub use controller::{
    ActionController, ActionFn, BoxFuture, Controller, HandlerResult, RestController,
};
pub use cookie::SetCookie;
pub use error::{AppError, AppResult, ErrorKind, ErrorReport};
pub use request::{Request, RequestId};
pub use response::Response;
pub use session::{MemorySessionStore, Session, SessionSettings, SessionStore};
pub use view::{content, ActionResult, ViewModel};

/// Framework version reported in error pages.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
