//! Built-in stage listeners.
//!
//! | Stage | Listener |
//! |---|---|
//! | route match | [`RouteListener`] |
//! | dispatch execute | [`DispatchExecuteListener`] |
//! | render | [`RenderListener`] |
//! | exception | [`ExceptionListener`] |

mod dispatch;
mod exception;
mod render;
mod route;

pub use dispatch::DispatchExecuteListener;
pub use exception::{ExceptionListener, FALLBACK_ERROR_TEMPLATE};
pub use render::RenderListener;
pub use route::RouteListener;
