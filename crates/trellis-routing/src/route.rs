//! Routes and their compile lifecycle.
//!
//! A route starts out `Building`: its name and middleware can still be
//! changed. The compiler moves it to `Compiled`, attaching the pipe that
//! runs its middleware and handler. From then on only attributes may be
//! added.

use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use serde_json::Value;
use trellis_core::{HandlerFn, TrellisError, TrellisResult};
use trellis_middleware::{MiddlewarePipe, MiddlewareRef};

use crate::resolver::RouteHandler;

/// Lifecycle state of a [`Route`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    /// Registered, still configurable.
    Building,
    /// Frozen and ready to dispatch.
    Compiled,
}

/// The matched route, stored as a request attribute by the router.
#[derive(Debug, Clone)]
pub struct CurrentRoute(pub Arc<Route>);

/// What compilation hands to [`Route::compile`].
#[derive(Default)]
pub struct CompileArgs {
    /// The handler a pending promise resolved to.
    pub handler: Option<HandlerFn>,
    /// The pipe running the route's middleware and handler.
    pub pipe: Option<MiddlewarePipe>,
}

/// One registered method set, path pattern and handler.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    methods: Vec<Method>,
    path: String,
    handler: RouteHandler,
    middlewares: Vec<MiddlewareRef>,
    attributes: IndexMap<String, Value>,
    pipe: Option<Arc<MiddlewarePipe>>,
    state: RouteState,
}

impl Route {
    /// Creates an unnamed route.
    #[must_use]
    pub fn new(methods: Vec<Method>, path: impl Into<String>, handler: RouteHandler) -> Self {
        Self {
            name: String::new(),
            methods,
            path: path.into(),
            handler,
            middlewares: Vec::new(),
            attributes: IndexMap::new(),
            pipe: None,
            state: RouteState::Building,
        }
    }

    fn ensure_building(&self, operation: &'static str) -> TrellisResult<()> {
        match self.state {
            RouteState::Building => Ok(()),
            RouteState::Compiled => Err(TrellisError::AlreadyCompiled { operation }),
        }
    }

    /// Freezes the route. A second call does nothing.
    pub fn compile(&mut self, args: CompileArgs) {
        if self.is_compiled() {
            return;
        }
        self.state = RouteState::Compiled;

        if let Some(handler) = args.handler {
            self.handler = RouteHandler::Resolved(handler);
        }
        if let Some(pipe) = args.pipe {
            self.pipe = Some(Arc::new(pipe));
        }
    }

    /// Returns true once compiled.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.state == RouteState::Compiled
    }

    /// The lifecycle state.
    #[must_use]
    pub fn state(&self) -> RouteState {
        self.state
    }

    /// The route name; empty when unnamed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The methods served.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// The normalized path pattern.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name if set, otherwise the path pattern.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.path
        } else {
            &self.name
        }
    }

    /// The handler, which may still be pending before compilation.
    #[must_use]
    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }

    /// Middleware attached to this route, group middleware first.
    #[must_use]
    pub fn middlewares(&self) -> &[MiddlewareRef] {
        &self.middlewares
    }

    /// The compiled pipe.
    ///
    /// # Errors
    ///
    /// [`TrellisError::PipeNotSet`] if compilation attached none.
    pub fn pipe(&self) -> TrellisResult<&Arc<MiddlewarePipe>> {
        self.pipe.as_ref().ok_or_else(|| TrellisError::PipeNotSet {
            path: self.path.clone(),
        })
    }

    /// Reads an attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Reads an attribute, or `default`.
    #[must_use]
    pub fn attribute_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.attributes.get(key).unwrap_or(default)
    }

    /// All attributes, in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Names the route.
    pub fn set_name(&mut self, name: impl Into<String>) -> TrellisResult<&mut Self> {
        self.ensure_building("set name")?;
        self.name = name.into();
        Ok(self)
    }

    /// Appends a middleware.
    pub fn middleware(&mut self, middleware: impl Into<MiddlewareRef>) -> TrellisResult<&mut Self> {
        self.ensure_building("add middleware")?;
        self.middlewares.push(middleware.into());
        Ok(self)
    }

    /// Sets an attribute. Allowed after compilation.
    pub fn with_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use trellis_core::{handler_fn, Response, ResponseExt};
    use trellis_middleware::{EmptyRequestHandler, Stage};

    fn ok() -> HandlerFn {
        handler_fn(|_| async { Ok(Response::empty(StatusCode::OK)) })
    }

    fn route() -> Route {
        Route::new(vec![Method::GET], "/posts/{id}", RouteHandler::Resolved(ok()))
    }

    fn pipe() -> MiddlewarePipe {
        MiddlewarePipe::new(Stage::handler(EmptyRequestHandler))
    }

    #[test]
    fn test_building_route_is_mutable() {
        let mut route = route();
        route
            .set_name("posts.show")
            .unwrap()
            .middleware("auth")
            .unwrap()
            .with_attribute("cache", 60);

        assert_eq!(route.name(), "posts.show");
        assert_eq!(route.label(), "posts.show");
        assert_eq!(route.middlewares().len(), 1);
        assert_eq!(route.attribute("cache"), Some(&Value::from(60)));
        assert_eq!(route.state(), RouteState::Building);
    }

    #[test]
    fn test_unnamed_route_is_labelled_by_path() {
        assert_eq!(route().label(), "/posts/{id}");
    }

    #[test]
    fn test_pipe_before_compile() {
        let err = route().pipe().unwrap_err();
        assert!(matches!(err, TrellisError::PipeNotSet { path } if path == "/posts/{id}"));
    }

    #[test]
    fn test_compile_is_idempotent() {
        let mut route = route();
        route.compile(CompileArgs {
            handler: None,
            pipe: Some(pipe()),
        });
        let first = Arc::clone(route.pipe().unwrap());

        route.compile(CompileArgs {
            handler: Some(ok()),
            pipe: Some(pipe()),
        });
        assert!(Arc::ptr_eq(&first, route.pipe().unwrap()));
    }

    #[test]
    fn test_compile_without_pipe() {
        let mut route = route();
        route.compile(CompileArgs::default());
        assert!(route.is_compiled());
        assert!(matches!(route.pipe(), Err(TrellisError::PipeNotSet { .. })));
    }

    #[test]
    fn test_compile_adopts_resolved_handler() {
        let mut route = Route::new(
            vec![Method::GET],
            "/",
            RouteHandler::Pending(crate::resolver::HandlerPromise::new(
                "Home".into(),
                Arc::new(crate::resolver::RegistryHandlerResolver::default()),
            )),
        );
        assert!(route.handler().is_pending());

        route.compile(CompileArgs {
            handler: Some(ok()),
            pipe: None,
        });
        assert!(!route.handler().is_pending());
    }

    #[test]
    fn test_compiled_route_rejects_mutation() {
        let mut route = route();
        route.compile(CompileArgs::default());

        assert!(matches!(
            route.set_name("late"),
            Err(TrellisError::AlreadyCompiled { operation: "set name" })
        ));
        assert!(matches!(
            route.middleware("auth"),
            Err(TrellisError::AlreadyCompiled { .. })
        ));
        assert_eq!(route.name(), "");

        route.with_attribute("late", true);
        assert_eq!(route.attribute("late"), Some(&Value::Bool(true)));
    }
}
