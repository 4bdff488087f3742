//! Error types for Trellis.
//!
//! [`TrellisError`] is the single error type flowing through route
//! registration, compilation and request dispatch. Each variant belongs to
//! one [`ErrorCategory`], which tells an error-handling middleware whether
//! the failure is a configuration bug or a request-level outcome.

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::di::InjectionError;

/// Result type alias using [`TrellisError`].
pub type TrellisResult<T> = Result<T, TrellisError>;

/// Where in the lifecycle an error originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Route, group or middleware registration (aborts startup).
    Registration,
    /// Handler resolution and route compilation.
    Compilation,
    /// Request matching: not found, method not allowed.
    Routing,
    /// A pipeline built or driven incorrectly.
    Pipeline,
    /// Failures raised by user handlers.
    Handler,
    /// A deadline elapsed.
    Timeout,
}

/// Why a route handler could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerFault {
    /// The reference does not name anything callable.
    NotCallable,
    /// The handler does not declare a non-nullable response return type.
    WrongReturnType,
}

/// Standard error type for Trellis.
///
/// # Example
///
/// ```
/// use trellis_core::{TrellisError, ErrorCategory};
/// use http::StatusCode;
///
/// let err = TrellisError::http(StatusCode::UNPROCESSABLE_ENTITY, "name is required");
/// assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
/// assert_eq!(err.category(), ErrorCategory::Handler);
/// ```
#[derive(Error, Debug)]
pub enum TrellisError {
    /// A middleware reference resolved to something that is neither a
    /// middleware nor a request handler.
    #[error("middleware must be a middleware or a request handler, got {type_name}")]
    TypeMismatch {
        /// Runtime type of the offending value.
        type_name: String,
    },

    /// A pipe was requested from an empty list.
    #[error("cannot create a pipe from an empty middleware list")]
    EmptyPipeline,

    /// A sub-pipe already terminating in a real request handler was merged.
    #[error("cannot merge a pipe that already ends with a request handler")]
    CannotMergeWithHandler,

    /// A route handler reference could not be resolved or validated.
    #[error("{message}")]
    WrongRouteHandler {
        /// Kind of fault.
        kind: HandlerFault,
        /// Human-readable message.
        message: String,
        /// The raw handler reference, for diagnostics.
        handler: String,
        /// The failure this one wraps.
        #[source]
        source: Option<Box<TrellisError>>,
    },

    /// A lazy handler resolver was asked to wrap another lazy resolver.
    #[error("a lazy route handler resolver cannot wrap another lazy resolver")]
    NestedLazyResolver,

    /// A compiled route was mutated.
    #[error("route is compiled: cannot {operation}")]
    AlreadyCompiled {
        /// The rejected mutation.
        operation: &'static str,
    },

    /// A compiled route has no pipe.
    #[error("route {path} doesn't have a pipe")]
    PipeNotSet {
        /// Path of the route.
        path: String,
    },

    /// A route pattern could not be registered.
    #[error(transparent)]
    InvalidRoute(#[from] trellis_router::RouteError),

    /// No route matches the request path.
    #[error("no route matches {method} {path}")]
    NotFound {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
    },

    /// A route matches the path but not the method.
    #[error("method not allowed, expected one of: {}", join_methods(.allowed))]
    MethodNotAllowed {
        /// Methods served for the path.
        allowed: Vec<Method>,
    },

    /// The sentinel terminal handler of a pipe was invoked.
    #[error("pipeline exhausted: the empty request handler was reached")]
    PipelineExhausted,

    /// The dispatcher ran past its last stage.
    #[error("step {step} not found")]
    StepNotFound {
        /// Cursor position that had no stage.
        step: usize,
    },

    /// The route invoker ran on a request the router never matched.
    #[error("request carries no matched route")]
    RouteNotMatched,

    /// A handler argument could not be resolved.
    #[error("unable to resolve argument `{name}`")]
    MissingArgument {
        /// Argument name.
        name: String,
    },

    /// A named route does not exist.
    #[error("route named `{name}` does not exist")]
    UnknownRoute {
        /// Requested name.
        name: String,
    },

    /// Dependency lookup failed.
    #[error(transparent)]
    Injection(#[from] InjectionError),

    /// A deadline elapsed before the response was ready.
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout {
        /// Configured deadline.
        elapsed_ms: u64,
    },

    /// A handler chose a specific status for its failure.
    #[error("{message}")]
    Http {
        /// Status to respond with.
        status: StatusCode,
        /// Human-readable message.
        message: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {message}")]
    Config {
        /// What was wrong.
        message: String,
    },

    /// A handler failed.
    #[error("{message}")]
    Handler {
        /// Human-readable message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl TrellisError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a type mismatch error for `value`.
    #[must_use]
    pub fn type_mismatch(type_name: impl Into<String>) -> Self {
        Self::TypeMismatch {
            type_name: type_name.into(),
        }
    }

    /// Creates a "not callable" handler error.
    #[must_use]
    pub fn not_callable(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WrongRouteHandler {
            kind: HandlerFault::NotCallable,
            message: message.into(),
            handler: handler.into(),
            source: None,
        }
    }

    /// Creates the error for a handler without a proper response return type.
    #[must_use]
    pub fn wrong_return_type(handler: impl Into<String>) -> Self {
        Self::WrongRouteHandler {
            kind: HandlerFault::WrongReturnType,
            message: "Handler must declare its return type to the response type or its implementation (not null)"
                .to_string(),
            handler: handler.into(),
            source: None,
        }
    }

    /// Re-raises a handler error with route context prepended, keeping the
    /// original as its source. Other errors are returned unchanged.
    #[must_use]
    pub fn with_route_context(self, methods: &[Method], path: &str) -> Self {
        match self {
            Self::WrongRouteHandler {
                kind,
                ref message,
                ref handler,
                ..
            } => {
                let verbs = methods.iter().map(Method::as_str).collect::<Vec<_>>().join("|");
                let message = format!("{verbs} {path}: {message}");
                let handler = handler.clone();
                Self::WrongRouteHandler {
                    kind,
                    message,
                    handler,
                    source: Some(Box::new(self)),
                }
            }
            other => other,
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(method: Method, path: impl Into<String>) -> Self {
        Self::NotFound {
            method,
            path: path.into(),
        }
    }

    /// Creates an error carrying an explicit status.
    #[must_use]
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a handler error.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a handler error wrapping `source`.
    pub fn handler_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Handler {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns true for a handler error caused by a missing or nullable
    /// response return type.
    #[must_use]
    pub fn is_wrong_return_type(&self) -> bool {
        matches!(
            self,
            Self::WrongRouteHandler {
                kind: HandlerFault::WrongReturnType,
                ..
            }
        )
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::TypeMismatch { .. }
            | Self::EmptyPipeline
            | Self::CannotMergeWithHandler
            | Self::NestedLazyResolver
            | Self::AlreadyCompiled { .. }
            | Self::InvalidRoute(_)
            | Self::UnknownRoute { .. }
            | Self::Injection(_)
            | Self::Config { .. } => ErrorCategory::Registration,
            Self::WrongRouteHandler { .. } | Self::PipeNotSet { .. } => ErrorCategory::Compilation,
            Self::NotFound { .. } | Self::MethodNotAllowed { .. } => ErrorCategory::Routing,
            Self::PipelineExhausted | Self::StepNotFound { .. } | Self::RouteNotMatched => {
                ErrorCategory::Pipeline
            }
            Self::MissingArgument { .. } | Self::Http { .. } | Self::Handler { .. } => {
                ErrorCategory::Handler
            }
            Self::Timeout { .. } => ErrorCategory::Timeout,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Http { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::EmptyPipeline => "EMPTY_PIPELINE",
            Self::CannotMergeWithHandler => "CANNOT_MERGE_WITH_HANDLER",
            Self::WrongRouteHandler {
                kind: HandlerFault::NotCallable,
                ..
            } => "HANDLER_NOT_CALLABLE",
            Self::WrongRouteHandler {
                kind: HandlerFault::WrongReturnType,
                ..
            } => "WRONG_RETURN_TYPE",
            Self::NestedLazyResolver => "NESTED_LAZY_RESOLVER",
            Self::AlreadyCompiled { .. } => "ALREADY_COMPILED",
            Self::PipeNotSet { .. } => "PIPE_NOT_SET",
            Self::InvalidRoute(_) => "INVALID_ROUTE",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Self::PipelineExhausted => "PIPELINE_EXHAUSTED",
            Self::StepNotFound { .. } => "STEP_NOT_FOUND",
            Self::RouteNotMatched => "ROUTE_NOT_MATCHED",
            Self::MissingArgument { .. } => "MISSING_ARGUMENT",
            Self::UnknownRoute { .. } => "UNKNOWN_ROUTE",
            Self::Injection(_) => "INJECTION_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Http { .. } => "HTTP_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Handler { .. } => "HANDLER_ERROR",
        }
    }

    /// Converts this error to a serializable envelope.
    ///
    /// Messages of server errors are replaced by a generic text unless
    /// `expose_details` is set.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>, expose_details: bool) -> ErrorEnvelope {
        let status = self.status_code();
        let message = if status.is_server_error() && !expose_details {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            self.to_string()
        };
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                category: self.category(),
                request_id: request_id.map(ToString::to_string),
            },
        }
    }
}

/// JSON error envelope: `{"error": {code, message, category, request_id}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error details.
    pub error: ErrorDetail,
}

/// Body of an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Lifecycle category.
    pub category: ErrorCategory,
    /// Correlation id, if the request carried one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_id: Option<String>,
}
