//! Telemetry emission middleware.
//!
//! Logs each request and records metrics for it:
//!
//! - `trellis_requests_total` / `trellis_request_duration_seconds`, labelled
//!   with the matched route's name (or pattern), method and status
//! - `trellis_in_flight_requests`
//! - `trellis_routing_failures_total` for 404 and 405 outcomes
//!
//! The route label comes from the [`RouteLabel`] the router attaches to the
//! response, or from the [`RouteLabelSlot`] it fills when the matched route
//! fails. Requests no route answered are labelled `unmatched`.

use std::time::Instant;

use trellis_core::{
    BoxFuture, HandlerResult, Request, RequestExt, RequestHandler, RouteLabel, RouteLabelSlot,
    TrellisError,
};
use trellis_telemetry::metrics::{record_request, record_routing_failure, InFlightGuard};

use crate::middleware::Middleware;

const UNMATCHED: &str = "unmatched";

/// Emits structured logs and metrics for every request.
#[derive(Debug, Clone, Default)]
pub struct TelemetryMiddleware {
    /// Log successful requests at info instead of debug.
    verbose: bool,
}

impl TelemetryMiddleware {
    /// Logs successful requests at debug level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs successful requests at info level.
    #[must_use]
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl Middleware for TelemetryMiddleware {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn process<'a>(
        &'a self,
        mut request: Request,
        next: &'a dyn RequestHandler,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let _in_flight = InFlightGuard::new();
            let slot = RouteLabelSlot::new();
            request.set_attribute(slot.clone());
            let start = Instant::now();
            let method = request.method().clone();
            let path = request.uri().path().to_string();
            let request_id = request.request_id().map(|id| id.to_string()).unwrap_or_default();

            let result = next.handle(request).await;
            let duration = start.elapsed();
            let duration_ms = duration.as_secs_f64() * 1000.0;

            match &result {
                Ok(response) => {
                    let route = response
                        .extensions()
                        .get::<RouteLabel>()
                        .map(|label| label.0.as_str())
                        .or_else(|| slot.get())
                        .unwrap_or(UNMATCHED);
                    let status = response.status().as_u16();
                    record_request(route, method.as_str(), status, duration);
                    if self.verbose {
                        tracing::info!(%request_id, %method, %path, route, status, duration_ms, "request completed");
                    } else {
                        tracing::debug!(%request_id, %method, %path, route, status, duration_ms, "request completed");
                    }
                }
                Err(error) => {
                    match error {
                        TrellisError::NotFound { .. } => record_routing_failure("not_found"),
                        TrellisError::MethodNotAllowed { .. } => {
                            record_routing_failure("method_not_allowed");
                        }
                        _ => {}
                    }
                    let route = slot.get().unwrap_or(UNMATCHED);
                    let status = error.status_code().as_u16();
                    record_request(route, method.as_str(), status, duration);
                    tracing::warn!(
                        %request_id,
                        %method,
                        %path,
                        route,
                        status,
                        duration_ms,
                        code = error.code(),
                        "request failed"
                    );
                }
            }
            result
        })
    }
}
