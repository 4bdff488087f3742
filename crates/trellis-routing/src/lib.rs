//! # Trellis Routing
//!
//! Route registration, compilation and dispatch.
//!
//! Routing happens in two phases:
//!
//! 1. **Registration**: a [`RouteCollector`] accumulates [`Route`]s. Groups
//!    contribute a path prefix, middleware, attributes and a controller
//!    namespace to the routes declared inside them.
//! 2. **Compilation**: [`RouteCollector::router`] compiles every route into
//!    a middleware pipe ending in the [`RouteInvoker`], and snapshots the
//!    path table into an immutable [`Router`].
//!
//! ```text
//! Router ─ match ─→ route pipe: group mw → route mw → RouteInvoker → handler
//!    │
//!    ├─ no path matched     → NotFound
//!    └─ path, not method    → MethodNotAllowed { allowed }
//! ```
//!
//! Handlers are functions or named controller actions ([`HandlerRef`]).
//! Actions are resolved through an [`ActionRegistry`], either when the
//! route is registered ([`RegistryHandlerResolver`]) or when it is compiled
//! ([`LazyRouteHandlerResolver`]).
//!
//! ## Example
//!
//! ```rust
//! use http::StatusCode;
//! use trellis_core::{Response, ResponseExt};
//! use trellis_routing::{HandlerRef, RouteCollector};
//!
//! # fn main() -> trellis_core::TrellisResult<()> {
//! let mut routes = RouteCollector::default();
//! routes.get("/users/{id}", HandlerRef::function(|inv| async move {
//!     let id: u64 = inv.parse("id")?;
//!     Response::json(StatusCode::OK, &serde_json::json!({ "id": id }))
//! }))?;
//!
//! let router = routes.router()?;
//! assert_eq!(router.len(), 1);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-routing/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod collector;
pub mod compiler;
pub mod group;
pub mod handler;
pub mod invoker;
pub mod resolver;
pub mod route;
pub mod router;

pub use collector::{ResourceOptions, RouteCollector, RouteCollectorFactory, ANY_METHODS};
pub use compiler::RouteCompiler;
pub use group::GroupParameters;
pub use handler::{Action, ActionRegistry, HandlerRef, ReturnType};
pub use invoker::RouteInvoker;
pub use resolver::{
    HandlerPromise, LazyRouteHandlerResolver, RegistryHandlerResolver, RouteHandler,
    RouteHandlerResolver,
};
pub use route::{CompileArgs, CurrentRoute, Route, RouteState};
pub use router::{Router, RouterFactory};
