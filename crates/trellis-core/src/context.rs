//! Request attributes.
//!
//! A request's `http::Extensions` act as its attribute bag. Middleware and
//! the router store typed values there; handlers read them back through
//! [`RequestExt`].

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use trellis_router::Params;
use uuid::Uuid;

use crate::types::Request;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines sortable by request.
///
/// ```
/// use trellis_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses an incoming header value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Path arguments captured by the router for the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteArgs(pub Params);

/// Name (or pattern, for unnamed routes) of the route that produced a
/// response. The router stores it in the response extensions for
/// telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLabel(pub String);

/// A request attribute the router fills with the matched route's label.
///
/// Stages in front of the router insert one before calling `next` and read
/// it back afterwards, including when the route's pipe failed and no
/// response carries a [`RouteLabel`]. Clones share the same slot.
///
/// ```
/// use trellis_core::RouteLabelSlot;
///
/// let slot = RouteLabelSlot::new();
/// slot.clone().fill("posts.show");
/// slot.fill("ignored");
/// assert_eq!(slot.get(), Some("posts.show"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteLabelSlot(Arc<OnceLock<String>>);

impl RouteLabelSlot {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `label`; the first match wins.
    pub fn fill(&self, label: impl Into<String>) {
        let _ = self.0.set(label.into());
    }

    /// The recorded label, if a route matched.
    #[must_use]
    pub fn get(&self) -> Option<&str> {
        self.0.get().map(String::as_str)
    }
}

/// Attribute access on requests.
pub trait RequestExt {
    /// Reads the attribute of type `T`.
    fn attribute<T: Clone + Send + Sync + 'static>(&self) -> Option<&T>;

    /// Stores `value`, returning the previous attribute of that type.
    fn set_attribute<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T>;

    /// Path arguments captured for the matched route.
    fn route_args(&self) -> Option<&Params> {
        self.attribute::<RouteArgs>().map(|args| &args.0)
    }

    /// The correlation id assigned by the request-id middleware.
    fn request_id(&self) -> Option<RequestId> {
        self.attribute::<RequestId>().copied()
    }
}

impl RequestExt for Request {
    fn attribute<T: Clone + Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions().get::<T>()
    }

    fn set_attribute<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.extensions_mut().insert(value)
    }
}
