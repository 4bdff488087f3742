//! Built-in middleware stages.
//!
//! Applications usually install them in this order, outermost first:
//!
//! 1. [`request_id`] - Generate/propagate request ID
//! 2. [`cors`] - CORS headers and preflight answers
//! 3. [`error_handling`] - Render errors as responses
//! 4. [`telemetry`] - Emit metrics and logs
//! 5. [`timeout`] - Per-request deadline

pub mod cors;
pub mod error_handling;
pub mod request_id;
pub mod telemetry;
pub mod timeout;

pub use cors::CorsMiddleware;
pub use error_handling::{ErrorHandler, ErrorHandlingMiddleware, JsonErrorHandler};
pub use request_id::RequestIdMiddleware;
pub use telemetry::TelemetryMiddleware;
pub use timeout::TimeoutMiddleware;
