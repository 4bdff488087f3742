//! Request ID middleware.
//!
//! Gives every request a correlation id:
//!
//! 1. **X-Request-ID header**: used when incoming ids are trusted and the
//!    value parses as a UUID
//! 2. **Generated UUID v7**: otherwise
//!
//! The id is stored as a request attribute ([`RequestExt::request_id`]) and
//! echoed in the `X-Request-ID` response header.

use http::HeaderValue;
use trellis_core::{BoxFuture, HandlerResult, Request, RequestExt, RequestHandler, RequestId};

use crate::middleware::Middleware;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that generates or propagates request IDs.
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    /// Whether incoming `X-Request-ID` headers are reused.
    ///
    /// Leave off for traffic from outside the trust boundary.
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Always generates fresh ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses valid incoming ids.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    fn extract(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(RequestId::parse)
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        mut request: Request,
        next: &'a dyn RequestHandler,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let request_id = self.extract(&request).unwrap_or_else(RequestId::new);
            request.set_attribute(request_id);

            let mut response = next.handle(request).await?;

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use trellis_core::{FnHandler, Response, ResponseExt};

    fn request(header: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    /// Answers with the attribute it saw, as text.
    fn echo() -> impl RequestHandler {
        FnHandler::new(|request: Request| async move {
            let seen = request.request_id().map(|id| id.to_string()).unwrap_or_default();
            Ok(Response::text(StatusCode::OK, seen))
        })
    }

    async fn body(response: Response) -> String {
        let bytes = trellis_core::read_body(response.into_body()).await;
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_generates_id() {
        let mw = RequestIdMiddleware::new();
        let response = mw.process(request(None), &echo()).await.unwrap();

        let header = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        assert!(RequestId::parse(&header).is_some());
        assert_eq!(body(response).await, header);
    }

    #[tokio::test]
    async fn test_untrusted_header_ignored() {
        let incoming = RequestId::new().to_string();
        let mw = RequestIdMiddleware::new();
        let response = mw.process(request(Some(&incoming)), &echo()).await.unwrap();
        assert_ne!(response.headers()[REQUEST_ID_HEADER], incoming.as_str());
    }

    #[tokio::test]
    async fn test_trusted_header_reused() {
        let incoming = RequestId::new().to_string();
        let mw = RequestIdMiddleware::trust_incoming();
        let response = mw.process(request(Some(&incoming)), &echo()).await.unwrap();
        assert_eq!(response.headers()[REQUEST_ID_HEADER], incoming.as_str());

        let response = mw.process(request(Some("garbage")), &echo()).await.unwrap();
        assert_ne!(response.headers()[REQUEST_ID_HEADER], "garbage");
    }
}
