//! Error handling middleware.
//!
//! Turns a [`TrellisError`] raised anywhere further down the chain into a
//! response. Rendering is pluggable through [`ErrorHandler`]; the default
//! [`JsonErrorHandler`] produces the standard envelope:
//!
//! ```json
//! {
//!   "error": {
//!     "code": "NOT_FOUND",
//!     "message": "no route for GET /missing",
//!     "category": "routing",
//!     "request_id": "0190b7a4-..."
//!   }
//! }
//! ```
//!
//! Messages of 5xx errors are replaced by the status reason unless details
//! are exposed (debug mode).

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::Method;
use http_body_util::Full;
use trellis_core::{
    BoxFuture, HandlerResult, Request, RequestExt, RequestHandler, RequestId, Response,
    ResponseExt, TrellisError,
};

use crate::middleware::Middleware;

/// Renders an error as a response.
pub trait ErrorHandler: Send + Sync + 'static {
    /// Builds the response for `error`.
    fn render(&self, error: &TrellisError, request_id: Option<RequestId>) -> Response;
}

/// Renders errors as JSON envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorHandler {
    expose_details: bool,
}

impl JsonErrorHandler {
    /// Creates a handler; `expose_details` keeps 5xx messages visible.
    #[must_use]
    pub fn new(expose_details: bool) -> Self {
        Self { expose_details }
    }
}

impl ErrorHandler for JsonErrorHandler {
    fn render(&self, error: &TrellisError, request_id: Option<RequestId>) -> Response {
        let status = error.status_code();
        let request_id = request_id.map(|id| id.to_string());
        let envelope = error.to_envelope(request_id.as_deref(), self.expose_details);

        let mut response = match serde_json::to_vec(&envelope) {
            Ok(body) => {
                let mut response = http::Response::new(Full::new(Bytes::from(body)));
                *response.status_mut() = status;
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                response
            }
            Err(_) => Response::json_error(status, error.code(), "error"),
        };

        if let TrellisError::MethodNotAllowed { allowed } = error {
            if let Ok(value) = HeaderValue::from_str(&allow_header(allowed)) {
                response.headers_mut().insert(ALLOW, value);
            }
        }
        response
    }
}

fn allow_header(allowed: &[Method]) -> String {
    allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Middleware converting downstream errors into responses.
///
/// Place it first so every other stage's failures are rendered.
#[derive(Clone)]
pub struct ErrorHandlingMiddleware {
    handler: Arc<dyn ErrorHandler>,
}

impl Default for ErrorHandlingMiddleware {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ErrorHandlingMiddleware {
    /// Uses the JSON handler.
    #[must_use]
    pub fn new(expose_details: bool) -> Self {
        Self::with_handler(JsonErrorHandler::new(expose_details))
    }

    /// Uses a custom handler.
    pub fn with_handler<H: ErrorHandler>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl std::fmt::Debug for ErrorHandlingMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandlingMiddleware").finish_non_exhaustive()
    }
}

impl Middleware for ErrorHandlingMiddleware {
    fn name(&self) -> &'static str {
        "error_handling"
    }

    fn process<'a>(
        &'a self,
        request: Request,
        next: &'a dyn RequestHandler,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let request_id = request.request_id();
            let method = request.method().clone();
            let path = request.uri().path().to_string();

            match next.handle(request).await {
                Ok(response) => Ok(response),
                Err(error) => {
                    let status = error.status_code();
                    if status.is_server_error() {
                        tracing::error!(
                            %method,
                            %path,
                            code = error.code(),
                            error = %error,
                            "request failed"
                        );
                    } else {
                        tracing::debug!(%method, %path, code = error.code(), "request rejected");
                    }
                    Ok(self.handler.render(&error, request_id))
                }
            }
        })
    }
}
