//! Request handler trait.
//!
//! A [`RequestHandler`] turns a request into a response. Routers, compiled
//! route pipes, dispatchers and route invokers all implement it, so any of
//! them can sit at the end of a middleware chain.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::TrellisResult;
use crate::types::{Request, Response};

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What every handler and middleware produces.
pub type HandlerResult = TrellisResult<Response>;

/// Handles a request, producing a response.
///
/// # Example
///
/// ```rust
/// use trellis_core::{BoxFuture, HandlerResult, Request, RequestHandler, Response, ResponseExt};
/// use http::StatusCode;
///
/// struct Health;
///
/// impl RequestHandler for Health {
///     fn handle(&self, _request: Request) -> BoxFuture<'_, HandlerResult> {
///         Box::pin(async { Ok(Response::text(StatusCode::OK, "ok")) })
///     }
/// }
/// ```
pub trait RequestHandler: Send + Sync {
    /// Handles `request`.
    fn handle(&self, request: Request) -> BoxFuture<'_, HandlerResult>;
}

impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    fn handle(&self, request: Request) -> BoxFuture<'_, HandlerResult> {
        (**self).handle(request)
    }
}

/// A closure-based request handler.
///
/// ```rust
/// use trellis_core::{FnHandler, Response, ResponseExt};
/// use http::StatusCode;
///
/// let handler = FnHandler::new(|_request| async { Ok(Response::empty(StatusCode::NO_CONTENT)) });
/// ```
pub struct FnHandler<F> {
    f: F,
}

impl<F, Fut> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, Fut> RequestHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, request: Request) -> BoxFuture<'_, HandlerResult> {
        Box::pin((self.f)(request))
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    fn request(path: &str) -> Request {
        http::Request::builder()
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_fn_handler() {
        let handler = FnHandler::new(|req: Request| async move {
            Ok(Response::text(StatusCode::OK, req.uri().path().to_string()))
        });

        let response = handler.handle(request("/echo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_arc_dyn_handler() {
        let handler: Arc<dyn RequestHandler> =
            Arc::new(FnHandler::new(|_| async { Ok(Response::empty(StatusCode::ACCEPTED)) }));

        let response = handler.handle(request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
