//! # Trellis Test
//!
//! In-memory request testing for Trellis applications. Requests are handed
//! straight to a [`RequestHandler`](trellis_core::RequestHandler): no
//! sockets, no ports, the full middleware pipeline.
//!
//! ## Example
//!
//! ```ignore
//! use trellis::prelude::*;
//! use trellis_test::TestClient;
//!
//! #[tokio::test]
//! async fn test_status() {
//!     let client = TestClient::new(app.build()?);
//!
//!     client
//!         .get("/status")
//!         .send()
//!         .await
//!         .assert_status(StatusCode::OK)
//!         .assert_json_eq(&json!({ "status": "UP" }));
//!
//!     client
//!         .post("/status")
//!         .send()
//!         .await
//!         .assert_status(StatusCode::METHOD_NOT_ALLOWED)
//!         .assert_allow(&["GET"]);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/trellis-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
