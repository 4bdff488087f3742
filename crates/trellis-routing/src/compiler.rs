//! Route compilation.

use std::sync::Arc;

use trellis_core::{RequestHandler, TrellisResult};
use trellis_middleware::{MiddlewarePipeFactory, MiddlewareRef, Stage};

use crate::invoker::RouteInvoker;
use crate::resolver::RouteHandler;
use crate::route::{CompileArgs, Route};

/// Builds each route's pipe and settles pending handlers.
///
/// The pipe runs the route's middleware in order and ends with the shared
/// [`RouteInvoker`]. Handler errors raised while settling a pending promise
/// are prefixed with the route's methods and path.
#[derive(Debug, Clone)]
pub struct RouteCompiler {
    pipe_factory: MiddlewarePipeFactory,
    invoker: Arc<RouteInvoker>,
}

impl Default for RouteCompiler {
    fn default() -> Self {
        Self::new(MiddlewarePipeFactory::default(), RouteInvoker::new())
    }
}

impl RouteCompiler {
    /// Creates a compiler.
    #[must_use]
    pub fn new(pipe_factory: MiddlewarePipeFactory, invoker: RouteInvoker) -> Self {
        Self {
            pipe_factory,
            invoker: Arc::new(invoker),
        }
    }

    /// The invoker ending every pipe.
    #[must_use]
    pub fn invoker(&self) -> &RouteInvoker {
        &self.invoker
    }

    /// Compiles `route` unless it already is.
    ///
    /// # Errors
    ///
    /// - [`TrellisError::WrongRouteHandler`] from a pending handler, with
    ///   route context
    /// - any error building the pipe
    ///
    /// [`TrellisError::WrongRouteHandler`]: trellis_core::TrellisError::WrongRouteHandler
    pub fn compile(&self, route: &mut Route) -> TrellisResult<()> {
        if route.is_compiled() {
            return Ok(());
        }

        let handler = match route.handler() {
            RouteHandler::Pending(promise) => Some(
                promise
                    .resolve()
                    .map_err(|e| e.with_route_context(route.methods(), route.path()))?,
            ),
            RouteHandler::Resolved(_) => None,
        };

        let mut stages = route.middlewares().to_vec();
        let invoker: Arc<dyn RequestHandler> = self.invoker.clone();
        stages.push(MiddlewareRef::Stage(Stage::Handler(invoker)));
        let pipe = self.pipe_factory.create(stages)?;

        tracing::debug!(
            route = route.label(),
            stages = pipe.len(),
            "route compiled"
        );
        route.compile(CompileArgs {
            handler,
            pipe: Some(pipe),
        });
        Ok(())
    }
}
