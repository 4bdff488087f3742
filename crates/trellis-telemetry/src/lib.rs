//! Observability for Trellis applications.
//!
//! - **Logging**: structured JSON or pretty output through `tracing-subscriber`
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `trellis_requests_total` | Counter | `route`, `method`, `status` | Total request count |
//! | `trellis_request_duration_seconds` | Histogram | `route`, `method` | Request latency |
//! | `trellis_in_flight_requests` | Gauge | - | Currently processing requests |
//! | `trellis_routing_failures_total` | Counter | `kind` | Requests no route answered |
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder()
//!     .service_name("blog")
//!     .environment("production")
//!     .build();
//!
//! let guard = init_telemetry(&config)?;
//! if let Some(registry) = guard.metrics() {
//!     println!("{}", registry.render());
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, record_request, record_routing_failure, InFlightGuard, MetricsConfig, MetricsRegistry};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Handles to the installed telemetry subsystems.
///
/// Keep it alive for as long as metrics should be rendered.
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    metrics: Option<MetricsRegistry>,
}

impl TelemetryGuard {
    /// Creates a guard around an optional metrics registry.
    #[must_use]
    pub fn new(metrics: Option<MetricsRegistry>) -> Self {
        Self { metrics }
    }

    /// The Prometheus registry, if metrics were enabled.
    #[must_use]
    pub fn metrics(&self) -> Option<&MetricsRegistry> {
        self.metrics.as_ref()
    }
}

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<TelemetryGuard> {
    init_logging(&config.logging)?;
    let metrics = init_metrics(&config.metrics)?;
    Ok(TelemetryGuard::new(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_without_metrics() {
        let guard = TelemetryGuard::default();
        assert!(guard.metrics().is_none());
    }

    #[test]
    fn test_disabled_telemetry_initializes() {
        let config = TelemetryConfig::builder()
            .service_name("quiet")
            .logging(LogConfig {
                enabled: false,
                ..LogConfig::default()
            })
            .metrics(MetricsConfig {
                enabled: false,
                ..MetricsConfig::default()
            })
            .build();

        let guard = init_telemetry(&config).unwrap();
        assert!(guard.metrics().is_none());
    }
}
