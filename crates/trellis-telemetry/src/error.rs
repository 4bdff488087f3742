//! Telemetry error types.

use thiserror::Error;

/// Failures while installing logging or metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The Prometheus recorder could not be installed.
    #[error("metrics recorder: {0}")]
    MetricsInit(String),

    /// The tracing subscriber could not be installed.
    #[error("log subscriber: {0}")]
    LoggingInit(String),

    /// A setting was rejected before anything was installed.
    #[error("invalid telemetry setting: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::MetricsInit("recorder already installed".to_string());
        assert_eq!(err.to_string(), "metrics recorder: recorder already installed");
        let err = TelemetryError::InvalidConfig("empty buckets".to_string());
        assert_eq!(err.to_string(), "invalid telemetry setting: empty buckets");
    }
}
