//! Prometheus metrics for Trellis.
//!
//! Recording functions go through the `metrics` facade, so they are no-ops
//! until [`init_metrics`] installs the Prometheus recorder.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use trellis_telemetry::metrics::record_request;
//!
//! record_request("posts.show", "GET", 200, Duration::from_millis(12));
//! ```

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "trellis_requests_total";
/// Request latency histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "trellis_request_duration_seconds";
/// In-flight gauge name.
pub const IN_FLIGHT_REQUESTS: &str = "trellis_in_flight_requests";
/// Routing failure counter name.
pub const ROUTING_FAILURES_TOTAL: &str = "trellis_routing_failures_total";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Labels attached to every metric, such as `service` and `environment`.
    pub global_labels: Vec<(String, String)>,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global_labels: vec![("service".to_string(), "trellis".to_string())],
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Renders the installed recorder's metrics.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Wraps a Prometheus handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Installs the Prometheus recorder as the global `metrics` recorder.
///
/// Returns `None` when metrics are disabled.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` for empty buckets and
/// `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<Option<MetricsRegistry>> {
    if !config.enabled {
        return Ok(None);
    }

    let builder = config
        .global_labels
        .iter()
        .fold(PrometheusBuilder::new(), |builder, (key, value)| {
            builder.add_global_label(key.clone(), value.clone())
        });
    let handle = builder
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::InvalidConfig(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();

    Ok(Some(MetricsRegistry::new(handle)))
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests processed");
    describe_histogram!(REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
    describe_gauge!(
        IN_FLIGHT_REQUESTS,
        "Number of HTTP requests currently being processed"
    );
    describe_counter!(
        ROUTING_FAILURES_TOTAL,
        "Requests rejected by the router, by kind"
    );
}

/// Records a completed request.
///
/// `route` is the matched route's name, or its pattern when unnamed.
pub fn record_request(route: &str, method: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "route" => route.to_string(),
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a request that no route answered (`not_found`,
/// `method_not_allowed`).
pub fn record_routing_failure(kind: &'static str) {
    counter!(ROUTING_FAILURES_TOTAL, "kind" => kind).increment(1);
}

/// Increments the in-flight requests gauge.
pub fn increment_in_flight() {
    gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
}

/// Decrements the in-flight requests gauge.
pub fn decrement_in_flight() {
    gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
}

/// Keeps the in-flight gauge incremented while alive.
///
/// The gauge is decremented on drop, so a cancelled or panicking request
/// never leaves it inflated.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the gauge and returns the guard.
    #[must_use]
    pub fn new() -> Self {
        increment_in_flight();
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        decrement_in_flight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.duration_buckets.len(), 12);
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(init_metrics(&config).unwrap().is_none());
    }

    #[test]
    fn test_empty_buckets_rejected() {
        let config = MetricsConfig {
            duration_buckets: Vec::new(),
            ..MetricsConfig::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_recording_without_recorder() {
        record_request("posts.show", "GET", 200, Duration::from_millis(10));
        record_routing_failure("not_found");
        let guard = InFlightGuard::new();
        drop(guard);
    }
}
