//! Dependency injection container.
//!
//! Services are registered at application startup and looked up either by
//! type (`register` / `resolve`) or by string identifier (`bind` / `get`).
//! Identifier bindings are what middleware references and controller
//! names resolve through.
//!
//! # Example
//!
//! ```rust
//! use trellis_core::di::Container;
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! let mut container = Container::new();
//! container.register(Arc::new(Database { url: "postgres://localhost/db".into() }));
//! container.bind("db.url", String::from("postgres://localhost/db"));
//!
//! let db: Arc<Database> = container.resolve().unwrap();
//! let url: String = container.get_as("db.url").unwrap();
//! assert_eq!(db.url, url);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Error when a dependency cannot be resolved.
///
/// Always distinguishable from application errors raised by handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectionError {
    /// No service of the requested type was registered.
    #[error("failed to inject {type_name}: service not registered")]
    NotRegistered {
        /// The requested type.
        type_name: &'static str,
    },

    /// No binding exists for the identifier.
    #[error("no entry found for `{id}`")]
    NotFound {
        /// The requested identifier.
        id: String,
    },

    /// A binding exists but holds a different type.
    #[error("entry `{id}` holds {actual}, expected {expected}")]
    WrongType {
        /// The requested identifier.
        id: String,
        /// Type the caller asked for.
        expected: &'static str,
        /// Type actually bound.
        actual: &'static str,
    },
}

impl InjectionError {
    /// Creates a new injection error for a missing service.
    pub fn not_registered<T>() -> Self {
        Self::NotRegistered {
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// A value bound under a string identifier.
#[derive(Clone)]
pub struct Binding {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Binding {
    /// Runtime type name of the bound value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the value as `T`, if that is what was bound.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A dependency injection container.
///
/// # Thread Safety
///
/// The container is `Send + Sync`; it is built during startup and shared
/// read-only through an `Arc` afterwards.
#[derive(Default)]
pub struct Container {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    entries: HashMap<String, Binding>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service keyed by its type.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Resolves a service by type.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// Resolves a service by type or returns an error.
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.resolve().ok_or_else(InjectionError::not_registered::<T>)
    }

    /// Checks if a service of type `T` is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Binds `value` under `id`, replacing any previous binding.
    pub fn bind<T: Send + Sync + 'static>(&mut self, id: impl Into<String>, value: T) {
        self.entries.insert(
            id.into(),
            Binding {
                value: Arc::new(value),
                type_name: std::any::type_name::<T>(),
            },
        );
    }

    /// Looks up the binding for `id`.
    pub fn get(&self, id: &str) -> Result<&Binding, InjectionError> {
        self.entries.get(id).ok_or_else(|| InjectionError::NotFound {
            id: id.to_string(),
        })
    }

    /// Looks up `id` and clones it out as `T`.
    pub fn get_as<T: Clone + 'static>(&self, id: &str) -> Result<T, InjectionError> {
        let binding = self.get(id)?;
        binding
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| InjectionError::WrongType {
                id: id.to_string(),
                expected: std::any::type_name::<T>(),
                actual: binding.type_name,
            })
    }

    /// Returns true if `id` is bound.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the number of typed services and identifier bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len() + self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.entries.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.services.len())
            .field("bindings", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A service resolved from the container by type.
#[derive(Clone)]
pub struct Inject<T>(pub Arc<T>);

impl<T> Inject<T> {
    /// Converts into the inner `Arc`.
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Inject").field(&self.0).finish()
    }
}

impl<T: Send + Sync + 'static> Inject<T> {
    /// Extracts the service from a container.
    pub fn from_container(container: &Container) -> Result<Self, InjectionError> {
        container.resolve_required::<T>().map(Inject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Mailer {
        sender: String,
    }

    #[test]
    fn test_register_and_resolve() {
        let mut container = Container::new();
        container.register(Arc::new(Mailer {
            sender: "noreply@example.com".into(),
        }));

        let mailer: Arc<Mailer> = container.resolve().unwrap();
        assert_eq!(mailer.sender, "noreply@example.com");
        assert!(container.contains::<Mailer>());
    }

    #[test]
    fn test_resolve_required_missing() {
        let container = Container::new();
        let err = container.resolve_required::<Mailer>().unwrap_err();
        assert!(err.to_string().contains("Mailer"));
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_bind_and_get() {
        let mut container = Container::new();
        container.bind("greeting", "hello".to_string());

        let binding = container.get("greeting").unwrap();
        assert_eq!(binding.downcast_ref::<String>().map(String::as_str), Some("hello"));
        assert!(binding.type_name().contains("String"));
        assert!(container.has("greeting"));
    }

    #[test]
    fn test_get_missing_identifier() {
        let container = Container::new();
        let err = container.get("auth").unwrap_err();
        assert_eq!(err, InjectionError::NotFound { id: "auth".into() });
    }

    #[test]
    fn test_get_as_wrong_type() {
        let mut container = Container::new();
        container.bind("port", 8080_u16);

        let err = container.get_as::<String>("port").unwrap_err();
        assert!(matches!(err, InjectionError::WrongType { actual: "u16", .. }));
        assert_eq!(container.get_as::<u16>("port").unwrap(), 8080);
    }

    #[test]
    fn test_inject_from_container() {
        let mut container = Container::new();
        container.register(Arc::new(Mailer {
            sender: "ops@example.com".into(),
        }));

        let mailer = Inject::<Mailer>::from_container(&container).unwrap();
        assert_eq!(mailer.sender, "ops@example.com");
        assert!(Inject::<String>::from_container(&container).is_err());
    }

    #[test]
    fn test_len_counts_both_kinds() {
        let mut container = Container::new();
        assert!(container.is_empty());
        container.register(Arc::new(Mailer { sender: String::new() }));
        container.bind("x", 1_u8);
        assert_eq!(container.len(), 2);
    }
}
