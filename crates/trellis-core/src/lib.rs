//! # Trellis Core
//!
//! Core types and traits for the Trellis framework:
//!
//! - [`Request`] / [`Response`] - HTTP message aliases and [`ResponseExt`] builders
//! - [`RequestHandler`] - Anything that turns a request into a response
//! - [`TrellisError`] - Error taxonomy shared by every crate
//! - [`di::Container`] - Type- and identifier-keyed dependency container
//! - [`Invocation`] / [`HandlerFn`] - How route handlers are called
//! - [`RequestExt`] - Typed request attributes

#![doc(html_root_url = "https://docs.rs/trellis-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod di;
mod error;
mod handler;
mod invocation;
mod types;

pub use context::{RequestExt, RequestId, RouteArgs, RouteLabel, RouteLabelSlot};
pub use error::{ErrorCategory, ErrorDetail, ErrorEnvelope, HandlerFault, TrellisError, TrellisResult};
pub use handler::{BoxFuture, FnHandler, HandlerResult, RequestHandler};
pub use invocation::{handler_fn, request_type_key, Argument, HandlerFn, Invocation};
pub use trellis_router::Params;
pub use types::{read_body, Request, Response, ResponseExt};
