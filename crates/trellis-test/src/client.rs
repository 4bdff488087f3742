//! In-memory test client.

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use trellis_core::{FnHandler, Request, RequestExt, RequestHandler, Response, ResponseExt};
use trellis_middleware::stages::{ErrorHandler, JsonErrorHandler};

/// Sends requests straight into a [`RequestHandler`].
///
/// Anything that handles requests can be tested: a built application, a
/// router, a single route pipe. Errors the handler returns are rendered
/// with [`JsonErrorHandler`], the way the error-handling stage would.
///
/// ```rust
/// use http::StatusCode;
/// use trellis_core::{FnHandler, Response, ResponseExt};
/// use trellis_test::TestClient;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = TestClient::new(FnHandler::new(|_| async {
///     Ok(Response::text(StatusCode::OK, "pong"))
/// }));
///
/// let response = client.get("/ping").send().await;
/// assert_eq!(response.text().unwrap(), "pong");
/// # }
/// ```
#[must_use]
pub struct TestClient {
    handler: Arc<dyn RequestHandler>,
    errors: JsonErrorHandler,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Wraps `handler`.
    pub fn new(handler: impl RequestHandler + 'static) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    /// Wraps a shared handler.
    pub fn from_arc(handler: Arc<dyn RequestHandler>) -> Self {
        Self {
            handler,
            errors: JsonErrorHandler::default(),
            default_headers: Vec::new(),
        }
    }

    /// A client whose handler always answers `status` with `body`.
    pub fn fixed_response(status: StatusCode, body: impl Into<String>) -> Self {
        let body: Arc<str> = body.into().into();
        Self::new(FnHandler::new(move |_| {
            let body = Arc::clone(&body);
            async move { Ok(Response::text(status, body.as_ref())) }
        }))
    }

    /// Keeps 5xx messages in rendered errors.
    pub fn expose_details(mut self, expose: bool) -> Self {
        self.errors = JsonErrorHandler::new(expose);
        self
    }

    /// Adds a header to every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// A GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// A POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// A PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// A PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::patch(uri))
    }

    /// A DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// An OPTIONS request.
    pub fn options(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::options(uri))
    }

    /// A HEAD request.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::head(uri))
    }

    /// A request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    /// Dispatches an already built request.
    pub async fn execute(&self, mut request: Request) -> TestResponse {
        for (name, value) in &self.default_headers {
            let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) else {
                continue;
            };
            request.headers_mut().entry(name).or_insert(value);
        }

        let request_id = request.request_id();
        let response = match self.handler.handle(request).await {
            Ok(response) => response,
            Err(error) => self.errors.render(&error, request_id),
        };
        TestResponse::from_response(response).await
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// A request builder bound to a [`TestClient`].
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        Self { client, builder }
    }

    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `Origin` header.
    pub fn origin(mut self, origin: impl AsRef<str>) -> Self {
        self.builder = self.builder.origin(origin);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built; use
    /// [`try_send`](Self::try_send) to handle that.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("failed to build test request: {e}"),
        }
    }

    /// Sends the request, reporting build failures.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        Ok(self.client.execute(request).await)
    }
}
