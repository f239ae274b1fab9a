//! Name-keyed service locator.
//!
//! Routes name their handler by string, and renderers are configured by
//! string, so services are registered and resolved by name rather than by
//! type. Registration happens at bootstrap; afterwards the container is
//! shared read-only behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use vitruvius_core::Container;
//! use std::sync::Arc;
//!
//! struct Greeter(&'static str);
//!
//! let mut container = Container::new();
//! container.register("greeter", Arc::new(Greeter("hello")));
//!
//! let greeter: Arc<Greeter> = container.get("greeter").unwrap();
//! assert_eq!(greeter.0, "hello");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Error when a service cannot be resolved.
#[derive(Debug, Clone, Error)]
#[error("Failed to resolve service '{name}': {reason}")]
pub struct ContainerError {
    /// The requested service name.
    pub name: String,
    /// The reason for the failure.
    pub reason: String,
}

impl ContainerError {
    /// Creates an error for a missing service.
    pub fn not_registered(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: "service not registered".to_string(),
        }
    }

    /// Creates an error for a service registered with another type.
    pub fn type_mismatch<T>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: format!("service is not a {}", std::any::type_name::<T>()),
        }
    }
}

/// A service container keyed by name.
///
/// Values are cloned out on lookup, so register cheaply clonable handles
/// such as `Arc<T>` or `Arc<dyn Trait>`.
#[derive(Default)]
pub struct Container {
    services: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service under a name, replacing any previous one.
    pub fn register<T>(&mut self, name: impl Into<String>, service: T)
    where
        T: Any + Send + Sync,
    {
        self.services.insert(name.into(), Box::new(service));
    }

    /// Resolves a service by name.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] if the name is unknown or the service has a
    /// different type.
    pub fn get<T>(&self, name: &str) -> Result<T, ContainerError>
    where
        T: Any + Clone,
    {
        self.services
            .get(name)
            .ok_or_else(|| ContainerError::not_registered(name))?
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ContainerError::type_mismatch::<T>(name))
    }

    /// Returns true if a service is registered under the name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns true if the container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.services.keys().collect();
        names.sort();
        f.debug_struct("Container").field("services", &names).finish()
    }
}
