//! Turning handler references into callable functions.
//!
//! [`RegistryHandlerResolver`] resolves immediately, at registration time.
//! [`LazyRouteHandlerResolver`] returns a [`HandlerPromise`] instead; the
//! route compiler settles it when the router is built, by which point every
//! controller has been registered.

use std::fmt;
use std::sync::Arc;

use trellis_core::{HandlerFn, TrellisError, TrellisResult};

use crate::handler::{ActionRegistry, HandlerRef};

/// A route's handler: resolved, or waiting for the compiler.
#[derive(Clone)]
pub enum RouteHandler {
    /// Ready to call.
    Resolved(HandlerFn),
    /// Resolved when the route is compiled.
    Pending(HandlerPromise),
}

impl RouteHandler {
    /// Returns true while resolution is deferred.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// The function, settling a pending promise if necessary.
    pub fn resolve(&self) -> TrellisResult<HandlerFn> {
        match self {
            Self::Resolved(f) => Ok(Arc::clone(f)),
            Self::Pending(promise) => promise.resolve(),
        }
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(_) => f.write_str("Resolved"),
            Self::Pending(promise) => f.debug_tuple("Pending").field(promise.handler()).finish(),
        }
    }
}

/// A deferred resolution: the raw reference plus the resolver to use.
///
/// Nothing is cached; every call to [`resolve`](Self::resolve) asks the
/// resolver again.
#[derive(Clone)]
pub struct HandlerPromise {
    handler: HandlerRef,
    resolver: Arc<dyn RouteHandlerResolver>,
}

impl HandlerPromise {
    /// Promises to resolve `handler` through `resolver`.
    pub fn new(handler: HandlerRef, resolver: Arc<dyn RouteHandlerResolver>) -> Self {
        Self { handler, resolver }
    }

    /// The raw reference.
    #[must_use]
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// Resolves the reference now.
    pub fn resolve(&self) -> TrellisResult<HandlerFn> {
        self.resolver.resolve(self.handler.clone())?.resolve()
    }
}

impl fmt::Debug for HandlerPromise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerPromise")
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

/// Resolves the handler a route was declared with.
pub trait RouteHandlerResolver: Send + Sync {
    /// Resolves `handler`.
    ///
    /// # Errors
    ///
    /// [`TrellisError::WrongRouteHandler`] when the reference names nothing
    /// callable or an action without a response return type.
    fn resolve(&self, handler: HandlerRef) -> TrellisResult<RouteHandler>;

    /// Whether `controller` is known under that exact name.
    fn knows_controller(&self, _controller: &str) -> bool {
        false
    }

    /// Whether this resolver defers resolution.
    fn is_lazy(&self) -> bool {
        false
    }
}

/// Resolves references against an [`ActionRegistry`] immediately.
#[derive(Debug, Clone, Default)]
pub struct RegistryHandlerResolver {
    registry: Arc<ActionRegistry>,
}

impl RegistryHandlerResolver {
    /// Creates a resolver over `registry`.
    #[must_use]
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry actions are looked up in.
    #[must_use]
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    fn lookup(&self, raw: &HandlerRef, controller: &str, action: &str) -> TrellisResult<HandlerFn> {
        if !self.registry.has_controller(controller) {
            return Err(TrellisError::not_callable(
                raw.to_string(),
                format!("controller `{controller}` is not registered"),
            ));
        }
        let found = self.registry.get(controller, action).ok_or_else(|| {
            TrellisError::not_callable(
                raw.to_string(),
                format!("`{controller}` has no action `{action}`"),
            )
        })?;
        if !found.returns().is_response() {
            return Err(TrellisError::wrong_return_type(raw.to_string()));
        }
        Ok(Arc::clone(found.handler()))
    }
}

impl RouteHandlerResolver for RegistryHandlerResolver {
    fn resolve(&self, handler: HandlerRef) -> TrellisResult<RouteHandler> {
        let handler = handler.parsed();
        let resolved = match &handler {
            HandlerRef::Function(f) => Arc::clone(f),
            HandlerRef::Action { controller, action } => self.lookup(&handler, controller, action)?,
            HandlerRef::Invokable(controller) | HandlerRef::Named(controller) => {
                self.lookup(&handler, controller, ActionRegistry::INVOKE)?
            }
        };
        Ok(RouteHandler::Resolved(resolved))
    }

    fn knows_controller(&self, controller: &str) -> bool {
        self.registry.has_controller(controller)
    }
}

/// Defers resolution to route compilation.
#[derive(Clone)]
pub struct LazyRouteHandlerResolver {
    inner: Arc<dyn RouteHandlerResolver>,
}

impl LazyRouteHandlerResolver {
    /// Wraps an eager resolver.
    ///
    /// # Errors
    ///
    /// [`TrellisError::NestedLazyResolver`] if `inner` is itself lazy.
    pub fn new(inner: Arc<dyn RouteHandlerResolver>) -> TrellisResult<Self> {
        if inner.is_lazy() {
            return Err(TrellisError::NestedLazyResolver);
        }
        Ok(Self { inner })
    }
}

impl RouteHandlerResolver for LazyRouteHandlerResolver {
    fn resolve(&self, handler: HandlerRef) -> TrellisResult<RouteHandler> {
        Ok(RouteHandler::Pending(HandlerPromise::new(
            handler,
            Arc::clone(&self.inner),
        )))
    }

    fn knows_controller(&self, controller: &str) -> bool {
        self.inner.knows_controller(controller)
    }

    fn is_lazy(&self) -> bool {
        true
    }
}

impl fmt::Debug for LazyRouteHandlerResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRouteHandlerResolver").finish_non_exhaustive()
    }
}
