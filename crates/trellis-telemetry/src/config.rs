//! Telemetry configuration.
//!
//! [`TelemetryConfig`] ties logging and metrics to one service identity: the
//! service name ends up in every log line and, together with the
//! environment, as global labels on every metric.

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Settings for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name.
    pub service_name: String,
    /// Deployment environment, e.g. `production`.
    pub environment: String,
    /// Metrics settings.
    pub metrics: MetricsConfig,
    /// Logging settings.
    pub logging: LogConfig,
}

impl TelemetryConfig {
    /// Starts from the defaults.
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder {
            config: Self::default(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "trellis".to_string(),
            environment: "development".to_string(),
            metrics: MetricsConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Builds a [`TelemetryConfig`] whose subsystems agree on the service
/// identity.
#[derive(Debug, Clone)]
#[must_use]
pub struct TelemetryConfigBuilder {
    config: TelemetryConfig,
}

impl TelemetryConfigBuilder {
    /// Service name.
    pub fn service_name(mut self, name: &str) -> Self {
        self.config.service_name = name.to_string();
        self
    }

    /// Deployment environment.
    pub fn environment(mut self, env: &str) -> Self {
        self.config.environment = env.to_string();
        self
    }

    /// Replaces the metrics settings.
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.config.metrics = metrics;
        self
    }

    /// Replaces the logging settings.
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Stamps the service name into the logging settings and sets the
    /// `service` and `environment` metric labels, keeping any other labels.
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let mut config = self.config;
        config.logging.service_name = config.service_name.clone();

        let labels = &mut config.metrics.global_labels;
        labels.retain(|(key, _)| key != "service" && key != "environment");
        labels.push(("service".to_string(), config.service_name.clone()));
        labels.push(("environment".to_string(), config.environment.clone()));
        config
    }
}
