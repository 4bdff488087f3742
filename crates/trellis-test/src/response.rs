//! Buffered responses with assertion helpers.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use trellis_core::{read_body, Response};

/// A fully buffered response.
///
/// Assertion methods panic with a message naming the response, so they
/// read well in test output and chain:
///
/// ```rust
/// # use trellis_test::TestResponse;
/// # use http::{HeaderMap, StatusCode};
/// let response = TestResponse::new(StatusCode::OK, HeaderMap::new(), r#"{"status":"UP"}"#.into());
/// response
///     .assert_status(StatusCode::OK)
///     .assert_json_field("status", &serde_json::json!("UP"));
/// ```
#[derive(Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Buffers `response`.
    pub async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body: read_body(body).await,
        }
    }

    /// Creates a response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// The status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and visible ASCII.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// The `x-request-id` header.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header_str("x-request-id")
    }

    /// The methods listed in the `Allow` header.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<&str> {
        self.header_str(header::ALLOW.as_str())
            .map(|allow| allow.split(',').map(str::trim).collect())
            .unwrap_or_default()
    }

    /// The raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, TestError> {
        std::str::from_utf8(&self.body).map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The `error.code` of an error envelope body.
    #[must_use]
    pub fn error_code(&self) -> Option<String> {
        let body: Value = self.json().ok()?;
        body.pointer("/error/code")?.as_str().map(ToString::to_string)
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status differs.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "expected status {expected}, got {self:?}"
        );
        self
    }

    /// Asserts a header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    #[track_caller]
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        match self.header_str(name) {
            Some(actual) => assert_eq!(actual, expected.as_ref(), "header '{name}'"),
            None => panic!("header '{name}' missing from {self:?}"),
        }
        self
    }

    /// Asserts that the `Allow` header lists exactly `methods`, in any order.
    ///
    /// # Panics
    ///
    /// Panics if the sets differ.
    #[track_caller]
    pub fn assert_allow(&self, methods: &[&str]) -> &Self {
        let mut actual = self.allowed_methods();
        actual.sort_unstable();
        let mut expected = methods.to_vec();
        expected.sort_unstable();
        assert_eq!(actual, expected, "Allow header of {self:?}");
        self
    }

    /// Asserts the whole JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or differs.
    #[track_caller]
    pub fn assert_json_eq(&self, expected: &Value) -> &Self {
        match self.json::<Value>() {
            Ok(actual) => assert_eq!(&actual, expected, "JSON body"),
            Err(e) => panic!("{e} in {self:?}"),
        }
        self
    }

    /// Asserts one JSON field addressed by a dotted path such as
    /// `error.code` or `items.0.name`.
    ///
    /// # Panics
    ///
    /// Panics if the field is missing or differs.
    #[track_caller]
    pub fn assert_json_field(&self, path: &str, expected: &Value) -> &Self {
        let body: Value = match self.json() {
            Ok(body) => body,
            Err(e) => panic!("{e} in {self:?}"),
        };
        match body.pointer(&json_pointer(path)) {
            Some(actual) => assert_eq!(actual, expected, "JSON field '{path}'"),
            None => panic!("JSON field '{path}' missing from {body}"),
        }
        self
    }

    /// Asserts the `error.code` of an error envelope.
    ///
    /// # Panics
    ///
    /// Panics if the body is not an envelope or the code differs.
    #[track_caller]
    pub fn assert_error_code(&self, expected: &str) -> &Self {
        assert_eq!(
            self.error_code().as_deref(),
            Some(expected),
            "error code of {self:?}"
        );
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish()
    }
}

fn json_pointer(path: &str) -> String {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .fold(String::new(), |mut pointer, segment| {
            pointer.push('/');
            pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
            pointer
        })
}
