//! # Trellis Middleware
//!
//! Middleware composition for the Trellis framework.
//!
//! Two ways of running a chain of stages are provided:
//!
//! - [`MiddlewarePipe`]: a linked chain built by [`MiddlewarePipeFactory`].
//!   Compiled routes use pipes; a pipe placed inside another list is merged
//!   into it.
//! - [`Dispatcher`]: a flat, indexed list. Applications use one for their
//!   global middleware followed by the router.
//!
//! ```text
//! Request → RequestId → Cors → ErrorHandling → Telemetry → Timeout → Router
//!                                                                      ↓
//!                                             route pipe: group mw → route mw → invoker
//! ```
//!
//! A stage is a [`Middleware`], a terminal [`RequestHandler`], or a nested
//! pipe ([`Stage`]). Stages may also be referenced by container identifier
//! ([`MiddlewareRef::Named`]); [`MiddlewareResolver`] looks them up.
//!
//! ## Example
//!
//! ```
//! use http::StatusCode;
//! use trellis_core::{FnHandler, Response, ResponseExt};
//! use trellis_middleware::stages::{ErrorHandlingMiddleware, RequestIdMiddleware};
//! use trellis_middleware::{MiddlewarePipeFactory, MiddlewareRef};
//!
//! let pipe = MiddlewarePipeFactory::default()
//!     .create(vec![
//!         MiddlewareRef::middleware(RequestIdMiddleware::new()),
//!         MiddlewareRef::middleware(ErrorHandlingMiddleware::default()),
//!         MiddlewareRef::handler(FnHandler::new(|_| async {
//!             Ok(Response::text(StatusCode::OK, "hello"))
//!         })),
//!     ])
//!     .unwrap();
//! assert_eq!(pipe.len(), 3);
//! ```
//!
//! [`RequestHandler`]: trellis_core::RequestHandler

#![doc(html_root_url = "https://docs.rs/trellis-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dispatcher;
pub mod factory;
pub mod middleware;
pub mod pipe;
pub mod stage;
pub mod stages;

pub use dispatcher::{Dispatcher, DispatcherFactory};
pub use factory::MiddlewarePipeFactory;
pub use middleware::{FnMiddleware, Middleware};
pub use pipe::{EmptyRequestHandler, MiddlewarePipe};
pub use stage::{MiddlewareRef, MiddlewareResolver, Stage};
