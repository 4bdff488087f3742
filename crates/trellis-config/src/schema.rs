//! Configuration sections.

use http::Method;
use serde::{Deserialize, Serialize};
use trellis_telemetry::{LogConfig, LogFormat};

use crate::ConfigError;

/// Application identity and environment.
///
/// ```
/// use trellis_config::AppSection;
///
/// let app = AppSection::default();
/// assert_eq!(app.env, "development");
/// assert!(!app.debug);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppSection {
    /// Application name, used as the service name in logs and metrics.
    #[serde(default = "default_name")]
    pub name: String,

    /// Deployment environment (development, staging, production).
    #[serde(default = "default_env")]
    pub env: String,

    /// Exposes internal error messages in responses.
    #[serde(default)]
    pub debug: bool,

    /// Path every route is mounted under (e.g. "/blog").
    #[serde(default)]
    pub base_path: Option<String>,

    /// Public base URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Default timezone.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Default locale.
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            env: default_env(),
            debug: false,
            base_path: None,
            url: None,
            timezone: default_timezone(),
            locale: default_locale(),
        }
    }
}

fn default_name() -> String {
    "trellis".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

/// Route registration settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RoutingSection {
    /// Resolve controller actions when routes are compiled instead of when
    /// they are registered.
    #[serde(default)]
    pub lazy_handlers: bool,

    /// Names under which handlers receive the current request.
    #[serde(default = "default_request_aliases")]
    pub request_aliases: Vec<String>,

    /// Namespace prepended to controller names the registry does not know.
    #[serde(default)]
    pub default_namespace: Option<String>,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            lazy_handlers: false,
            request_aliases: default_request_aliases(),
            default_namespace: None,
        }
    }
}

fn default_request_aliases() -> Vec<String> {
    vec!["request".to_string()]
}

/// Request handling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    /// Per-request deadline in milliseconds. 0 disables the deadline.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Reuse valid incoming `X-Request-ID` headers.
    #[serde(default)]
    pub trust_request_id: bool,

    /// CORS headers.
    #[serde(default)]
    pub cors: CorsSection,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
            trust_request_id: false,
            cors: CorsSection::default(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30_000
}

/// CORS settings.
///
/// An origin list containing `"*"` allows any origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CorsSection {
    /// Whether the CORS middleware is installed.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Allowed origins.
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,

    /// Allowed methods.
    #[serde(default = "default_methods")]
    pub allowed_methods: Vec<String>,

    /// Allowed request headers.
    #[serde(default = "default_headers")]
    pub allowed_headers: Vec<String>,

    /// Sends `Access-Control-Allow-Credentials: true`.
    #[serde(default)]
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds. None omits the header.
    #[serde(default = "default_max_age")]
    pub max_age_secs: Option<u64>,
}

impl CorsSection {
    /// Returns true if any origin is allowed.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }

    /// Allowed methods, parsed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a malformed method name.
    pub fn methods(&self) -> Result<Vec<Method>, ConfigError> {
        self.allowed_methods
            .iter()
            .map(|name| {
                Method::from_bytes(name.to_ascii_uppercase().as_bytes()).map_err(|_| {
                    ConfigError::invalid(
                        "http.cors.allowed_methods",
                        format!("invalid method `{name}`"),
                    )
                })
            })
            .collect()
    }
}

impl Default for CorsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: default_origins(),
            allowed_methods: default_methods(),
            allowed_headers: default_headers(),
            allow_credentials: false,
            max_age_secs: default_max_age(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"]
        .map(String::from)
        .to_vec()
}

fn default_headers() -> Vec<String> {
    [
        "Content-Type",
        "Accept",
        "Access-Control-Allow-Headers",
        "Authorization",
        "X-Requested-With",
    ]
    .map(String::from)
    .to_vec()
}

#[allow(clippy::unnecessary_wraps)]
fn default_max_age() -> Option<u64> {
    Some(3600)
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Whether a subscriber is installed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directives, e.g. `"info"` or `"trellis_routing=debug,info"`.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// ANSI colors for human-readable formats.
    #[serde(default)]
    pub ansi_enabled: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl LoggingSection {
    /// Converts to the telemetry crate's logging configuration.
    #[must_use]
    pub fn to_log_config(&self, service_name: &str) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ansi: self.ansi_enabled,
            service_name: service_name.to_string(),
            ..LogConfig::default()
        }
    }
}
