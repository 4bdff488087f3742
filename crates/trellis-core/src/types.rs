//! HTTP message types used throughout Trellis.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use serde::Serialize;

use crate::error::{TrellisError, TrellisResult};

/// The HTTP request type handed through the pipeline.
///
/// The request's extensions serve as the attribute bag carrying match
/// results from the router to the route invoker.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by handlers and middleware.
pub type Response = http::Response<Full<Bytes>>;

/// Constructors for common responses.
pub trait ResponseExt {
    /// An empty response with `status`.
    fn empty(status: StatusCode) -> Response;

    /// A plain-text response.
    fn text(status: StatusCode, body: impl Into<String>) -> Response;

    /// A JSON response serialized from `value`.
    fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> TrellisResult<Response>;

    /// A redirect to `location`.
    fn redirect(location: &str, status: StatusCode) -> TrellisResult<Response>;

    /// A JSON error body `{"error": {"code", "message"}}`.
    fn json_error(status: StatusCode, code: &str, message: &str) -> Response;
}

fn with_body(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response {
    let mut response = http::Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

impl ResponseExt for Response {
    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }

    fn text(status: StatusCode, body: impl Into<String>) -> Response {
        with_body(status, "text/plain; charset=utf-8", body.into())
    }

    fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> TrellisResult<Response> {
        let body = serde_json::to_vec(value)
            .map_err(|e| TrellisError::handler_with_source("failed to serialize response body", e))?;
        Ok(with_body(status, "application/json", body))
    }

    fn redirect(location: &str, status: StatusCode) -> TrellisResult<Response> {
        let value = HeaderValue::try_from(location)
            .map_err(|e| TrellisError::handler_with_source("invalid redirect location", e))?;
        let mut response = Self::empty(status);
        response.headers_mut().insert(LOCATION, value);
        Ok(response)
    }

    fn json_error(status: StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });
        with_body(status, "application/json", body.to_string())
    }
}

/// Collects a buffered body into bytes.
pub async fn read_body(body: Full<Bytes>) -> Bytes {
    match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_response() {
        let response = Response::json(StatusCode::OK, &serde_json::json!({"status": "UP"})).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let body = read_body(response.into_body()).await;
        assert_eq!(&body[..], br#"{"status":"UP"}"#);
    }

    #[test]
    fn test_redirect_response() {
        let response = Response::redirect("/login", StatusCode::FOUND).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/login");
    }

    #[test]
    fn test_redirect_rejects_invalid_location() {
        assert!(Response::redirect("/bad\nheader", StatusCode::FOUND).is_err());
    }

    #[tokio::test]
    async fn test_json_error_response() {
        let response = Response::json_error(StatusCode::UNAUTHORIZED, "AUTH_REQUIRED", "login first");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = read_body(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");
    }

    #[test]
    fn test_text_response() {
        let response = Response::text(StatusCode::ACCEPTED, "queued");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }
}
