//! Request deadline middleware.

use std::time::Duration;

use trellis_core::{BoxFuture, HandlerResult, Request, RequestHandler, TrellisError};

use crate::middleware::Middleware;

/// Fails with [`TrellisError::Timeout`] when the rest of the chain takes
/// longer than the configured duration. The inner future is dropped.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutMiddleware {
    duration: Duration,
}

impl TimeoutMiddleware {
    /// Creates a middleware with the given deadline.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Deadline in milliseconds.
    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// The configured deadline.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Middleware for TimeoutMiddleware {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn process<'a>(
        &'a self,
        request: Request,
        next: &'a dyn RequestHandler,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let path = request.uri().path().to_string();
            match tokio::time::timeout(self.duration, next.handle(request)).await {
                Ok(result) => result,
                Err(_) => {
                    let elapsed_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX);
                    tracing::warn!(%path, elapsed_ms, "request deadline exceeded");
                    Err(TrellisError::Timeout { elapsed_ms })
                }
            }
        })
    }
}
