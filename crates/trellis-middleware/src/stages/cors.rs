//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! Adds `Access-Control-*` headers to responses and answers preflight
//! `OPTIONS` requests without reaching the router.
//!
//! The defaults allow any origin:
//!
//! | Header | Default |
//! |--------|---------|
//! | `Access-Control-Allow-Origin` | `*` |
//! | `Access-Control-Allow-Methods` | `GET, POST, PUT, DELETE, PATCH, OPTIONS` |
//! | `Access-Control-Allow-Headers` | `Content-Type, Accept, Access-Control-Allow-Headers, Authorization, X-Requested-With` |
//! | `Access-Control-Max-Age` | `3600` |
//!
//! ## Example
//!
//! ```
//! use http::Method;
//! use std::time::Duration;
//! use trellis_middleware::stages::CorsMiddleware;
//!
//! let cors = CorsMiddleware::builder()
//!     .allow_origin("https://app.example.com")
//!     .allow_methods([Method::GET, Method::POST])
//!     .allow_credentials(true)
//!     .max_age(Duration::from_secs(600))
//!     .build();
//! ```

use std::time::Duration;

use http::{HeaderMap, HeaderValue, Method, StatusCode};
use trellis_core::{
    BoxFuture, HandlerResult, Request, RequestExt, RequestHandler, Response, ResponseExt,
    TrellisError,
};

use crate::middleware::Middleware;
use crate::stages::error_handling::{ErrorHandler, JsonErrorHandler};

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Access-Control-Request-Method` header (preflight).
    pub const REQUEST_METHOD: &str = "access-control-request-method";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
    /// `Vary` header.
    pub const VARY: &str = "vary";
}

/// Which origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Any origin (`*`).
    Any,
    /// Only these origins; the matching origin is echoed back.
    List(Vec<String>),
}

impl AllowedOrigins {
    /// Checks if an origin is allowed.
    #[must_use]
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            Self::Any => true,
            Self::List(origins) => origins.iter().any(|o| o == origin),
        }
    }

    fn header_value(&self, origin: Option<&str>) -> Option<HeaderValue> {
        match (self, origin) {
            (Self::Any, _) => Some(HeaderValue::from_static("*")),
            (Self::List(_), Some(origin)) if self.is_allowed(origin) => {
                HeaderValue::from_str(origin).ok()
            }
            (Self::List(_), _) => None,
        }
    }
}

/// Configuration for [`CorsMiddleware`].
#[derive(Debug, Clone)]
pub struct CorsConfig {
    allowed_origins: AllowedOrigins,
    allowed_methods: Vec<Method>,
    allowed_headers: Vec<String>,
    allow_credentials: bool,
    max_age: Option<Duration>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::Any,
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ],
            allowed_headers: [
                "Content-Type",
                "Accept",
                "Access-Control-Allow-Headers",
                "Authorization",
                "X-Requested-With",
            ]
            .map(String::from)
            .to_vec(),
            allow_credentials: false,
            max_age: Some(Duration::from_secs(3600)),
        }
    }
}

/// Builder for [`CorsMiddleware`].
#[derive(Debug, Clone, Default)]
pub struct CorsBuilder {
    config: CorsConfig,
    origins: Vec<String>,
}

impl CorsBuilder {
    /// Starts from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows `origin`; once any origin is listed, only listed origins are
    /// allowed.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.origins.push(origin.into());
        self
    }

    /// Allows every origin in `origins`.
    #[must_use]
    pub fn allow_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origins.extend(origins.into_iter().map(Into::into));
        self
    }

    /// Replaces the allowed methods.
    #[must_use]
    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.config.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Replaces the allowed request headers.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets `Access-Control-Allow-Credentials`.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.config.allow_credentials = allow;
        self
    }

    /// Sets the preflight cache duration.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.config.max_age = Some(duration);
        self
    }

    /// Omits `Access-Control-Max-Age`.
    #[must_use]
    pub fn no_max_age(mut self) -> Self {
        self.config.max_age = None;
        self
    }

    /// Builds the middleware.
    #[must_use]
    pub fn build(mut self) -> CorsMiddleware {
        if !self.origins.is_empty() && !self.origins.iter().any(|o| o == "*") {
            self.config.allowed_origins = AllowedOrigins::List(self.origins);
        }
        CorsMiddleware {
            config: self.config,
        }
    }
}

/// Adds CORS headers and answers preflight requests with 204.
///
/// A preflight from an origin outside the allowed list is answered with a
/// 403 error envelope. The stage runs ahead of error handling, so it renders
/// that response itself.
#[derive(Debug, Clone, Default)]
pub struct CorsMiddleware {
    config: CorsConfig,
}

impl CorsMiddleware {
    /// The default, allow-everything configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::new()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CorsConfig {
        &self.config
    }

    fn is_preflight(request: &Request) -> bool {
        request.method() == Method::OPTIONS
            && request.headers().contains_key(headers::ORIGIN)
            && request.headers().contains_key(headers::REQUEST_METHOD)
    }

    fn origin(request: &Request) -> Option<String> {
        request
            .headers()
            .get(headers::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    fn apply(&self, target: &mut HeaderMap, origin: Option<&str>) {
        let Some(allow_origin) = self.config.allowed_origins.header_value(origin) else {
            return;
        };
        target.insert(headers::ALLOW_ORIGIN, allow_origin);
        if matches!(self.config.allowed_origins, AllowedOrigins::List(_)) {
            target.insert(headers::VARY, HeaderValue::from_static("Origin"));
        }

        let methods = self
            .config
            .allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if let Ok(value) = HeaderValue::from_str(&methods) {
            target.insert(headers::ALLOW_METHODS, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.config.allowed_headers.join(", ")) {
            target.insert(headers::ALLOW_HEADERS, value);
        }
        if self.config.allow_credentials {
            target.insert(headers::ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
        if let Some(max_age) = self.config.max_age {
            target.insert(headers::MAX_AGE, HeaderValue::from(max_age.as_secs()));
        }
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(
        &'a self,
        request: Request,
        next: &'a dyn RequestHandler,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let origin = Self::origin(&request);

            if Self::is_preflight(&request) {
                if let Some(origin) = origin.as_deref() {
                    if !self.config.allowed_origins.is_allowed(origin) {
                        let error = TrellisError::http(
                            StatusCode::FORBIDDEN,
                            format!("origin `{origin}` is not allowed"),
                        );
                        tracing::debug!(%origin, "preflight rejected");
                        return Ok(JsonErrorHandler::default().render(&error, request.request_id()));
                    }
                }
                let mut response = Response::empty(StatusCode::NO_CONTENT);
                self.apply(response.headers_mut(), origin.as_deref());
                return Ok(response);
            }

            let mut response = next.handle(request).await?;
            self.apply(response.headers_mut(), origin.as_deref());
            Ok(response)
        })
    }
}
