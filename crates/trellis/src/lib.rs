//! # Trellis
//!
//! **A micro-framework core for HTTP applications**
//!
//! Trellis provides:
//!
//! - **Middleware pipelines** – linked pipes for routes, a flat dispatcher for
//!   the application, both built from middleware, handlers or nested pipes
//! - **Route groups** – prefixes, middleware, attributes and controller
//!   namespaces inherited by every route declared inside a group
//! - **Compiled routing** – each route becomes its own pipe ending in the
//!   handler, matched through a radix table with placeholder constraints
//! - **Layered configuration** and **structured logging**
//!
//! ## Quick Start
//!
//! ```rust
//! use http::StatusCode;
//! use trellis::prelude::*;
//!
//! # fn main() -> TrellisResult<()> {
//! let mut app = App::from_config(AppConfig::default())?;
//! app.routes(|routes| {
//!     routes.group(GroupParameters::prefixed("/api"), |api| {
//!         api.get("/status", HandlerRef::function(|_| async {
//!             Response::json(StatusCode::OK, &serde_json::json!({ "status": "UP" }))
//!         }))?;
//!         Ok(())
//!     })
//! });
//!
//! let application = app.build()?;
//! assert_eq!(application.router().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → RequestId → Cors → ErrorHandling → Telemetry → Timeout → global mw → Router
//!                                                                                   ↓
//!                                          route pipe: group mw → route mw → RouteInvoker
//! ```

#![doc(html_root_url = "https://docs.rs/trellis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;

pub use app::{App, Application};

// Re-export core types
pub use trellis_core as core;

// Re-export middleware types
pub use trellis_middleware as middleware;

// Re-export the path table
pub use trellis_router as router;

// Re-export route registration
pub use trellis_routing as routing;

// Re-export configuration
pub use trellis_config as config;

// Re-export telemetry
pub use trellis_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{App, Application};

    pub use trellis_core::di::{Container, Inject};
    pub use trellis_core::{
        Invocation, Request, RequestExt, RequestHandler, RequestId, Response, ResponseExt,
        TrellisError, TrellisResult,
    };

    pub use trellis_middleware::{FnMiddleware, Middleware, MiddlewareRef};

    pub use trellis_routing::{
        ActionRegistry, CurrentRoute, GroupParameters, HandlerRef, ResourceOptions, Route,
        RouteCollector, Router,
    };

    pub use trellis_config::{AppConfig, Config, ConfigLoader};
}
