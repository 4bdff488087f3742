//! Route group parameters.
//!
//! Nested groups combine their parameters with [`GroupParameters::merge`]:
//!
//! | Field | Merge |
//! |---|---|
//! | `middleware` | outer list, then inner list |
//! | `attributes`, `extra` | deep merge by key; nested lists append |
//! | `namespace` | inner value wins when set |
//!
//! The `prefix` is not inherited through the parameters; the collector
//! takes it out and concatenates it onto the running path prefix.

use serde_json::{Map, Value};
use trellis_middleware::MiddlewareRef;

/// Parameters of a route group.
///
/// ```rust
/// use trellis_routing::GroupParameters;
///
/// let api = GroupParameters::new()
///     .prefix("/api")
///     .middleware("auth")
///     .attribute("version", 1);
/// assert_eq!(api.prefix_value(), Some("/api"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GroupParameters {
    prefix: Option<String>,
    middleware: Vec<MiddlewareRef>,
    attributes: Map<String, Value>,
    namespace: Option<String>,
    extra: Map<String, Value>,
}

impl GroupParameters {
    /// Empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters with only a prefix.
    #[must_use]
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self::new().prefix(prefix)
    }

    /// Sets the path prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Adds a middleware applied to every route in the group.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    /// Adds an attribute set on every route in the group.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the namespace prefixed onto controller names.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets a parameter the collector itself does not interpret.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The prefix, if set.
    #[must_use]
    pub fn prefix_value(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Removes and returns the prefix.
    pub fn take_prefix(&mut self) -> Option<String> {
        self.prefix.take()
    }

    /// Group middleware, outermost group first.
    #[must_use]
    pub fn middlewares(&self) -> &[MiddlewareRef] {
        &self.middleware
    }

    /// Attributes inherited by routes.
    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// The controller namespace.
    #[must_use]
    pub fn namespace_value(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Uninterpreted parameters.
    #[must_use]
    pub fn extras(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Combines `self` (outer) with `inner`.
    #[must_use]
    pub fn merge(&self, inner: GroupParameters) -> GroupParameters {
        let mut merged = self.clone();
        merged.middleware.extend(inner.middleware);
        merge_maps(&mut merged.attributes, inner.attributes);
        merge_maps(&mut merged.extra, inner.extra);
        if inner.namespace.is_some() {
            merged.namespace = inner.namespace;
        }
        if inner.prefix.is_some() {
            merged.prefix = inner.prefix;
        }
        merged
    }
}

fn merge_maps(into: &mut Map<String, Value>, from: Map<String, Value>) {
    for (key, value) in from {
        match into.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                into.insert(key, value);
            }
        }
    }
}

/// Objects merge by key, arrays append, anything else is replaced.
fn merge_value(into: &mut Value, from: Value) {
    match (into, from) {
        (Value::Object(a), Value::Object(b)) => merge_maps(a, b),
        (Value::Array(a), Value::Array(b)) => a.extend(b),
        (slot, value) => *slot = value,
    }
}
