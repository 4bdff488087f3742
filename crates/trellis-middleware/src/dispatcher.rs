//! Flat middleware dispatch.
//!
//! A [`Dispatcher`] runs an ordered list of stages. Each request walks the
//! list with its own cursor, so a dispatcher shared between concurrent
//! requests holds no per-request state.

use std::sync::Arc;

use trellis_core::{BoxFuture, HandlerResult, Request, RequestHandler, TrellisError, TrellisResult};

use crate::middleware::Middleware;
use crate::stage::{MiddlewareRef, MiddlewareResolver, Stage};

/// Runs stages in order; a terminal handler ends the chain.
///
/// ```
/// use http::StatusCode;
/// use trellis_core::{FnHandler, Response, ResponseExt};
/// use trellis_middleware::{Dispatcher, MiddlewareRef};
///
/// let mut dispatcher = Dispatcher::default();
/// dispatcher
///     .add(MiddlewareRef::handler(FnHandler::new(|_| async {
///         Ok(Response::empty(StatusCode::OK))
///     })))
///     .unwrap();
/// assert_eq!(dispatcher.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    stages: Vec<Stage>,
    resolver: MiddlewareResolver,
}

impl Dispatcher {
    /// An empty dispatcher resolving identifiers with `resolver`.
    #[must_use]
    pub fn new(resolver: MiddlewareResolver) -> Self {
        Self {
            stages: Vec::new(),
            resolver,
        }
    }

    /// Appends a stage.
    pub fn add(&mut self, middleware: impl Into<MiddlewareRef>) -> TrellisResult<&mut Self> {
        let stage = self.resolver.resolve(middleware.into())?;
        tracing::trace!(stage = stage.label(), position = self.stages.len(), "dispatcher stage added");
        self.stages.push(stage);
        Ok(self)
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if no stage was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs `request` from the first stage.
    pub fn dispatch(&self, request: Request) -> BoxFuture<'_, HandlerResult> {
        Cursor {
            stages: &self.stages,
            step: 0,
        }
        .run(request)
    }
}

impl RequestHandler for Dispatcher {
    fn handle(&self, request: Request) -> BoxFuture<'_, HandlerResult> {
        self.dispatch(request)
    }
}

/// A position in a dispatcher's stage list.
#[derive(Clone, Copy)]
struct Cursor<'a> {
    stages: &'a [Stage],
    step: usize,
}

impl<'a> Cursor<'a> {
    fn run(self, request: Request) -> BoxFuture<'a, HandlerResult> {
        let Some(stage) = self.stages.get(self.step) else {
            let step = self.step;
            return Box::pin(async move { Err(TrellisError::StepNotFound { step }) });
        };
        let next = Cursor {
            stages: self.stages,
            step: self.step + 1,
        };
        match stage {
            Stage::Handler(handler) => handler.handle(request),
            Stage::Middleware(middleware) => {
                Box::pin(async move { middleware.process(request, &next).await })
            }
            Stage::Pipe(pipe) => Box::pin(async move { pipe.process(request, &next).await }),
        }
    }
}

impl RequestHandler for Cursor<'_> {
    fn handle(&self, request: Request) -> BoxFuture<'_, HandlerResult> {
        self.run(request)
    }
}

/// Builds dispatchers sharing one resolver.
#[derive(Debug, Clone, Default)]
pub struct DispatcherFactory {
    resolver: MiddlewareResolver,
}

impl DispatcherFactory {
    /// Creates a factory resolving identifiers with `resolver`.
    #[must_use]
    pub fn new(resolver: MiddlewareResolver) -> Self {
        Self { resolver }
    }

    /// Builds a dispatcher running `middlewares` in order.
    pub fn create(&self, middlewares: Vec<MiddlewareRef>) -> TrellisResult<Arc<Dispatcher>> {
        let mut dispatcher = Dispatcher::new(self.resolver.clone());
        for middleware in middlewares {
            dispatcher.add(middleware)?;
        }
        Ok(Arc::new(dispatcher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use http::StatusCode;
    use std::sync::Mutex;
    use trellis_core::di::Container;
    use trellis_core::{FnHandler, Response, ResponseExt};

    fn request() -> Request {
        http::Request::builder()
            .uri("/")
            .body(http_body_util::Full::new(bytes::Bytes::new()))
            .unwrap()
    }

    fn recording(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> MiddlewareRef {
        let log = Arc::clone(log);
        MiddlewareRef::middleware(FnMiddleware::new(name, move |request, next| {
            log.lock().unwrap().push(name);
            Box::pin(async move { next.handle(request).await })
        }))
    }

    fn handler(status: StatusCode) -> MiddlewareRef {
        MiddlewareRef::handler(FnHandler::new(move |_| async move { Ok(Response::empty(status)) }))
    }

    #[tokio::test]
    async fn test_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = DispatcherFactory::default()
            .create(vec![
                recording("a", &log),
                recording("b", &log),
                recording("c", &log),
                handler(StatusCode::OK),
            ])
            .unwrap();

        let response = dispatcher.handle(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_handler_ends_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = DispatcherFactory::default()
            .create(vec![
                recording("before", &log),
                handler(StatusCode::NO_CONTENT),
                recording("after", &log),
            ])
            .unwrap();

        let response = dispatcher.handle(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(*log.lock().unwrap(), vec!["before"]);
    }

    #[tokio::test]
    async fn test_missing_step() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = DispatcherFactory::default()
            .create(vec![recording("a", &log), recording("b", &log)])
            .unwrap();

        let err = dispatcher.handle(request()).await.unwrap_err();
        assert!(matches!(err, TrellisError::StepNotFound { step: 2 }));

        let empty = Dispatcher::default();
        let err = empty.handle(request()).await.unwrap_err();
        assert!(matches!(err, TrellisError::StepNotFound { step: 0 }));
    }

    #[tokio::test]
    async fn test_repeat_dispatch_starts_over() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = DispatcherFactory::default()
            .create(vec![recording("a", &log), handler(StatusCode::OK)])
            .unwrap();

        dispatcher.handle(request()).await.unwrap();
        dispatcher.handle(request()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "a"]);
    }

    #[tokio::test]
    async fn test_pipe_stage_falls_through() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner = crate::factory::MiddlewarePipeFactory::default()
            .create(vec![recording("inner", &log)])
            .unwrap();
        let dispatcher = DispatcherFactory::default()
            .create(vec![
                recording("outer", &log),
                MiddlewareRef::pipe(inner),
                handler(StatusCode::OK),
            ])
            .unwrap();

        dispatcher.handle(request()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn test_named_stages() {
        let mut container = Container::new();
        let not_found: Arc<dyn RequestHandler> = Arc::new(FnHandler::new(|_| async {
            Ok(Response::empty(StatusCode::NOT_FOUND))
        }));
        container.bind("fallback", not_found);

        let factory = DispatcherFactory::new(MiddlewareResolver::with_container(Arc::new(container)));
        let dispatcher = factory.create(vec!["fallback".into()]).unwrap();
        let response = dispatcher.handle(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert!(factory.create(vec!["unknown".into()]).is_err());
    }
}
