//! Core middleware trait.
//!
//! A [`Middleware`] sees the request on its way in, decides whether to call
//! `next`, and sees the response (or error) on its way out. `next` is any
//! [`RequestHandler`]: the rest of a pipe, the remaining steps of a
//! dispatcher, or a terminal handler.
//!
//! # Example
//!
//! ```
//! use trellis_core::{BoxFuture, HandlerResult, Request, RequestHandler};
//! use trellis_middleware::Middleware;
//!
//! struct Logging;
//!
//! impl Middleware for Logging {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         request: Request,
//!         next: &'a dyn RequestHandler,
//!     ) -> BoxFuture<'a, HandlerResult> {
//!         Box::pin(async move {
//!             tracing::info!(path = %request.uri().path(), "request");
//!             let response = next.handle(request).await?;
//!             tracing::info!(status = %response.status(), "response");
//!             Ok(response)
//!         })
//!     }
//! }
//! ```

use std::sync::Arc;

use trellis_core::{BoxFuture, HandlerResult, Request, RequestHandler};

/// The core middleware trait.
///
/// # Invariants
///
/// - `next` is invoked at most once per request unless the middleware is
///   deliberately retrying
/// - Errors from `next` propagate unchanged unless the middleware exists
///   to translate them
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Processes `request`, delegating to `next` to continue the chain.
    fn process<'a>(
        &'a self,
        request: Request,
        next: &'a dyn RequestHandler,
    ) -> BoxFuture<'a, HandlerResult>;
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn process<'a>(
        &'a self,
        request: Request,
        next: &'a dyn RequestHandler,
    ) -> BoxFuture<'a, HandlerResult> {
        (**self).process(request, next)
    }
}

/// A middleware built from a closure.
///
/// ```
/// use http::HeaderValue;
/// use trellis_middleware::FnMiddleware;
///
/// let stamp = FnMiddleware::new("stamp", |request, next| {
///     Box::pin(async move {
///         let mut response = next.handle(request).await?;
///         response.headers_mut().insert("x-powered-by", HeaderValue::from_static("trellis"));
///         Ok(response)
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(Request, &'a dyn RequestHandler) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(Request, &'a dyn RequestHandler) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        request: Request,
        next: &'a dyn RequestHandler,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.func)(request, next)
    }
}

impl<F> std::fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use trellis_core::{FnHandler, Response, ResponseExt, TrellisError};

    fn request() -> Request {
        http::Request::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    struct Tagging {
        tag: &'static str,
    }

    impl Middleware for Tagging {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn process<'a>(
            &'a self,
            request: Request,
            next: &'a dyn RequestHandler,
        ) -> BoxFuture<'a, HandlerResult> {
            Box::pin(async move {
                let mut response = next.handle(request).await?;
                response
                    .headers_mut()
                    .append("x-tag", http::HeaderValue::from_static(self.tag));
                Ok(response)
            })
        }
    }

    #[tokio::test]
    async fn test_middleware_wraps_next() {
        let handler = FnHandler::new(|_| async { Ok(Response::empty(StatusCode::OK)) });
        let mw = Tagging { tag: "outer" };

        let response = mw.process(request(), &handler).await.unwrap();
        assert_eq!(response.headers()["x-tag"], "outer");
    }

    #[tokio::test]
    async fn test_arc_dyn_middleware() {
        let mw: Arc<dyn Middleware> = Arc::new(Tagging { tag: "shared" });
        let handler = FnHandler::new(|_| async { Ok(Response::empty(StatusCode::OK)) });

        assert_eq!(mw.name(), "shared");
        let response = mw.process(request(), &handler).await.unwrap();
        assert_eq!(response.headers()["x-tag"], "shared");
    }

    #[tokio::test]
    async fn test_fn_middleware_short_circuit() {
        let deny = FnMiddleware::new("deny", |_request, _next| {
            Box::pin(async { Err(TrellisError::http(StatusCode::FORBIDDEN, "nope")) })
        });
        let handler = FnHandler::new(|_| async { Ok(Response::empty(StatusCode::OK)) });

        let err = deny.process(request(), &handler).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(deny.name(), "deny");
    }
}
