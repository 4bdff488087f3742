//! Root configuration and its flattened view.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trellis_telemetry::logging::create_env_filter;
use trellis_telemetry::LogFormat;

use crate::{AppSection, ConfigError, HttpSection, LoggingSection, RoutingSection};

/// Complete application configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// ```
/// use trellis_config::AppConfig;
///
/// let config = AppConfig::default();
/// assert_eq!(config.app.name, "trellis");
/// assert_eq!(config.http.request_timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application identity and environment.
    #[serde(default)]
    pub app: AppSection,

    /// Route registration.
    #[serde(default)]
    pub routing: RoutingSection,

    /// Request handling.
    #[serde(default)]
    pub http: HttpSection,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Free-form application settings.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl AppConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `app.name` is empty
    /// - `app.base_path` contains placeholders or optional parts
    /// - `logging.level` is not a valid filter while logging is enabled
    /// - a CORS method is not a valid HTTP method
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.trim().is_empty() {
            return Err(ConfigError::invalid("app.name", "must not be empty"));
        }

        if let Some(base_path) = &self.app.base_path {
            if base_path.contains(['{', '}', '[', ']', '*']) {
                return Err(ConfigError::invalid(
                    "app.base_path",
                    format!("must be a literal path: {base_path}"),
                ));
            }
        }

        if self.logging.enabled {
            create_env_filter(&self.logging.level).map_err(|e| {
                ConfigError::invalid("logging.level", e.to_string())
            })?;
        }

        self.http.cors.methods()?;
        Ok(())
    }

    /// Development preset: pretty debug logs and exposed error details.
    ///
    /// ```
    /// use trellis_config::AppConfig;
    ///
    /// let config = AppConfig::development();
    /// assert!(config.app.debug);
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.app.env = "development".to_string();
        config.app.debug = true;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config
    }

    /// Production preset: JSON logs, hidden error details, lazy handler
    /// resolution.
    ///
    /// ```
    /// use trellis_config::AppConfig;
    ///
    /// let config = AppConfig::production();
    /// assert!(!config.app.debug);
    /// assert_eq!(config.logging.format, trellis_telemetry::LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.app.env = "production".to_string();
        config.app.debug = false;
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;
        config.routing.lazy_handlers = true;
        config
    }
}

/// Immutable, string-keyed view over an [`AppConfig`].
///
/// Every section and value is addressable by its dotted path, including
/// keys under `settings`:
///
/// ```
/// use trellis_config::{Config, ConfigLoader};
///
/// let config: Config = ConfigLoader::new()
///     .with_string("[settings.mail]\nfrom = \"noreply@example.com\"", "toml")
///     .unwrap()
///     .load()
///     .unwrap()
///     .try_into()
///     .unwrap();
///
/// assert_eq!(config.get_as::<String>("app.name").unwrap(), "trellis");
/// assert_eq!(config.get("settings.mail.from").unwrap(), "noreply@example.com");
/// assert_eq!(config.get_or("settings.mail.port", 25), 25);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    typed: Arc<AppConfig>,
    values: Arc<BTreeMap<String, Value>>,
}

impl Config {
    /// Builds the view.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the configuration cannot be
    /// represented as JSON.
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        let mut values = BTreeMap::new();
        if let Value::Object(sections) = serde_json::to_value(&config)? {
            for (key, value) in sections {
                flatten(key, value, &mut values);
            }
        }
        Ok(Self {
            typed: Arc::new(config),
            values: Arc::new(values),
        })
    }

    /// The typed configuration.
    #[must_use]
    pub fn app(&self) -> &AppConfig {
        &self.typed
    }

    /// The value at `key`, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The value at `key`, or `default`.
    #[must_use]
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.get(key).cloned().unwrap_or_else(|| default.into())
    }

    /// The value at `key`, deserialized.
    ///
    /// # Errors
    ///
    /// `Missing` if the key is not set, `Invalid` if the value
    /// does not deserialize into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.get(key).ok_or_else(|| ConfigError::missing(key))?;
        T::deserialize(value).map_err(|e| ConfigError::invalid(key, e.to_string()))
    }

    /// Returns true if `key` is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Every key, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl TryFrom<AppConfig> for Config {
    type Error = ConfigError;

    fn try_from(config: AppConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

// Records `value` under `key` and, for objects, every nested key.
fn flatten(key: String, value: Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (child, nested) in &map {
                flatten(format!("{key}.{child}"), nested.clone(), out);
            }
            out.insert(key, Value::Object(map));
        }
        other => {
            out.insert(key, other);
        }
    }
}
