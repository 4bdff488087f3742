//! Radix tree path-matching table for Trellis.
//!
//! The table maps `(method, path pattern)` registrations to an arbitrary
//! payload and answers `dispatch(method, path)` with one of three
//! outcomes: found (with the captured placeholders), method not allowed
//! (with the exact set of methods served for the path) or not found.
//!
//! # Pattern syntax
//!
//! - **Static segments**: `/users/me`
//! - **Placeholders**: `/users/{id}`
//! - **Constrained placeholders**: `/users/{id:\d+}`
//! - **Catch-all wildcards**: `/files/*path`
//! - **Optional trailing parts**: `/archive[/{year}[/{month}]]`
//!
//! # Example
//!
//! ```rust
//! use trellis_router::{Dispatch, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table.add(Method::GET, "/users", 0_usize).unwrap();
//! table.add(Method::GET, "/users/{id}", 1).unwrap();
//!
//! match table.dispatch(&Method::POST, "/users") {
//!     Dispatch::MethodNotAllowed { allowed } => assert_eq!(allowed, vec![Method::GET]),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐      "*path"
//!        │           │
//!     [GET,POST]  "{id:\d+}"
//!                    │
//!               [GET,DELETE]
//! ```

mod error;
mod method_table;
mod node;
mod params;
mod pattern;
mod table;

pub use error::RouteError;
pub use method_table::MethodTable;
pub use node::Node;
pub use params::Params;
pub use pattern::{expand_optional, normalize_path, Constraint, RoutePattern, Segment};
pub use table::RouteTable;

use http::Method;

/// The outcome of matching a request against a [`RouteTable`].
#[derive(Debug)]
pub enum Dispatch<'a, T> {
    /// A pattern matched and serves the method.
    Found {
        /// The registered payload
        payload: &'a T,
        /// Values captured by placeholders
        params: Params,
    },
    /// At least one pattern matched, none serves the method.
    MethodNotAllowed {
        /// Methods served for the path, in registration order
        allowed: Vec<Method>,
    },
    /// No pattern matched the path.
    NotFound,
}

impl<T> Dispatch<'_, T> {
    /// Returns true for [`Dispatch::Found`].
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}
