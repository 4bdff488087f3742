//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;
use trellis_core::TrellisError;

/// Failures while loading configuration or reading values from it.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required file does not exist.
    #[error("config file `{}` does not exist", path.display())]
    NotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("cannot read config file `{}`", path.display())]
    Read {
        /// The unreadable file.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Neither TOML nor JSON.
    #[error("unsupported config format `{0}`, expected toml or json")]
    UnsupportedFormat(String),

    /// Malformed TOML, or TOML with unknown keys.
    #[error("TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or JSON with unknown keys.
    #[error("JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A value failed validation or has the wrong type.
    #[error("`{key}`: {reason}")]
    Invalid {
        /// Dotted key of the value.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A looked-up key is not set.
    #[error("`{key}` is not set")]
    Missing {
        /// Dotted key.
        key: String,
    },

    /// An override variable could not be applied.
    #[error("environment override `{var}`: {reason}")]
    Env {
        /// Variable name.
        var: String,
        /// What went wrong.
        reason: String,
    },
}

impl ConfigError {
    /// [`ConfigError::NotFound`].
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// [`ConfigError::Read`].
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// [`ConfigError::Invalid`].
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// [`ConfigError::Missing`].
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }

    /// [`ConfigError::Env`].
    pub fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for TrellisError {
    fn from(err: ConfigError) -> Self {
        TrellisError::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConfigError::not_found("/etc/blog/app.toml");
        assert_eq!(err.to_string(), "config file `/etc/blog/app.toml` does not exist");

        let err = ConfigError::invalid("http.request_timeout_ms", "invalid type: string");
        assert_eq!(err.to_string(), "`http.request_timeout_ms`: invalid type: string");

        let err = ConfigError::env("TRELLIS__APP__DEBUG", "expected a boolean");
        assert_eq!(
            err.to_string(),
            "environment override `TRELLIS__APP__DEBUG`: expected a boolean"
        );
    }

    #[test]
    fn test_read_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::read("app.toml", io);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_converts_to_framework_error() {
        let err: TrellisError = ConfigError::missing("app.name").into();
        assert!(matches!(err, TrellisError::Config { .. }));
        assert!(err.to_string().contains("app.name"));
    }
}
