//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::{AppConfig, ConfigError};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones key by key:
/// 1. Default values or a preset
/// 2. Configuration files and strings (TOML or JSON), in the order given
/// 3. Environment variables `PREFIX__SECTION__KEY`
///
/// Unknown keys are rejected in every layer.
///
/// # Example
///
/// ```no_run
/// use trellis_config::ConfigLoader;
///
/// # fn main() -> Result<(), trellis_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("config/app.toml")?
///     .with_env_prefix("TRELLIS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    base: AppConfig,
    layers: Vec<Value>,
    env_prefix: Option<String>,
    env_vars: Option<Vec<(String, String)>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: AppConfig::default(),
            layers: Vec::new(),
            env_prefix: None,
            env_vars: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.base = AppConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// ```
    /// use trellis_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.app.debug);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.base = AppConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.base = AppConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is taken from the extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The extension is neither `toml` nor `json`
    /// - The file contains invalid TOML/JSON or unknown fields
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.with_string(&content, format)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Same as [`with_file`](Self::with_file) when the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `format` (`"toml"` or `"json"`).
    ///
    /// ```
    /// use trellis_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [app]
    ///     name = "blog"
    ///
    ///     [routing]
    ///     lazy_handlers = true
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.app.name, "blog");
    /// assert!(config.routing.lazy_handlers);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unsupported or parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer = match format.to_ascii_lowercase().as_str() {
            "toml" => {
                // Parse into the typed form first for located errors.
                toml::from_str::<AppConfig>(content)?;
                serde_json::to_value(toml::from_str::<toml::Value>(content)?)?
            }
            "json" => {
                serde_json::from_str::<AppConfig>(content)?;
                serde_json::from_str::<Value>(content)?
            }
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        self.layers.push(layer);
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`; nested keys add
    /// more `__` separated parts. With prefix `TRELLIS`:
    /// - `TRELLIS__APP__DEBUG=true`
    /// - `TRELLIS__HTTP__CORS__ALLOWED_ORIGINS=["https://app.example.com"]`
    /// - `TRELLIS__SETTINGS__MAIL__FROM=noreply@example.com`
    ///
    /// Values are read as JSON when they parse as such, otherwise as
    /// plain strings.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Read overrides from `vars` instead of the process environment.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Finalize and return the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be applied
    /// or validation fails.
    pub fn load(self) -> Result<AppConfig, ConfigError> {
        let config = self.load_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Finalize without validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be applied.
    pub fn load_unvalidated(self) -> Result<AppConfig, ConfigError> {
        let mut tree = serde_json::to_value(&self.base)?;
        for layer in self.layers {
            merge(&mut tree, layer);
        }

        if let Some(prefix) = &self.env_prefix {
            let mut vars: Vec<(String, String)> = match self.env_vars {
                Some(vars) => vars,
                None => env::vars().collect(),
            };
            vars.sort();
            let marker = format!("{prefix}__");
            for (key, value) in vars {
                if let Some(path) = key.strip_prefix(&marker) {
                    apply_env_var(&mut tree, &key, path, &value)?;
                }
            }
        }

        Ok(serde_json::from_value(tree)?)
    }
}

// Objects merge key by key; anything else in `layer` replaces `base`.
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn apply_env_var(tree: &mut Value, var: &str, path: &str, raw: &str) -> Result<(), ConfigError> {
    let keys: Vec<String> = path.split("__").map(str::to_lowercase).collect();
    if keys.iter().any(String::is_empty) {
        return Err(ConfigError::env(var, "empty key segment"));
    }

    let mut candidates = Vec::with_capacity(2);
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        candidates.push(parsed);
    }
    candidates.push(Value::String(raw.to_string()));

    let mut last_error = None;
    for candidate in candidates {
        let mut attempt = tree.clone();
        set_path(&mut attempt, &keys, candidate)
            .map_err(|reason| ConfigError::env(var, reason))?;
        match serde_json::from_value::<AppConfig>(attempt.clone()) {
            Ok(_) => {
                *tree = attempt;
                return Ok(());
            }
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    Err(ConfigError::env(
        var,
        last_error.unwrap_or_else(|| "rejected".to_string()),
    ))
}

fn set_path(tree: &mut Value, keys: &[String], value: Value) -> Result<(), String> {
    let Some((last, parents)) = keys.split_last() else {
        return Err("no key given".to_string());
    };

    let mut node = tree;
    for key in parents {
        node = match node {
            Value::Object(map) => {
                let child = map
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if child.is_null() {
                    *child = Value::Object(Map::new());
                }
                child
            }
            _ => return Err(format!("`{key}` is not inside a table")),
        };
    }

    match node {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        _ => Err(format!("`{last}` is not inside a table")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use trellis_telemetry::LogFormat;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_loader_with_development() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"app": {"name": "shop", "base_path": "/shop"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.app.name, "shop");
        assert_eq!(config.app.base_path.as_deref(), Some("/shop"));
    }

    #[test]
    fn test_layers_merge_key_by_key() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[app]\nname = \"blog\"", "toml")
            .unwrap()
            .with_string("[http.cors]\nallowed_origins = [\"https://blog.example\"]", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.app.name, "blog");
        // preset values not named by a later layer survive
        assert!(config.app.debug);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.http.cors.allowed_origins, vec!["https://blog.example"]);
        assert!(config.http.cors.enabled);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ConfigLoader::new().with_string("[app]\nnmae = \"typo\"", "toml");
        assert!(matches!(result, Err(ConfigError::Toml(_))));

        let result = ConfigLoader::new().with_string(r#"{"router": {}}"#, "json");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("name: x", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ref f)) if f == "yaml"));
    }

    #[test]
    fn test_loader_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[routing]\nlazy_handlers = true\ndefault_namespace = \"app::\"").unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert!(config.routing.lazy_handlers);
        assert_eq!(config.routing.default_namespace.as_deref(), Some("app::"));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/app.toml");
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/app.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_validation_runs_on_load() {
        let loader = || ConfigLoader::new().with_string("[app]\nname = \"\"", "toml").unwrap();
        assert!(matches!(loader().load(), Err(ConfigError::Invalid { .. })));
        assert_eq!(loader().load_unvalidated().unwrap().app.name, "");
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .with_env_prefix("trellis")
            .with_env_vars([
                ("TRELLIS__APP__DEBUG", "true"),
                ("TRELLIS__APP__NAME", "404"),
                ("TRELLIS__HTTP__REQUEST_TIMEOUT_MS", "1500"),
                ("TRELLIS__HTTP__CORS__ALLOWED_ORIGINS", r#"["https://a.example"]"#),
                ("TRELLIS__LOGGING__FORMAT", "compact"),
                ("TRELLIS__SETTINGS__MAIL__FROM", "noreply@example.com"),
                ("OTHER__APP__NAME", "ignored"),
            ])
            .load()
            .unwrap();

        assert!(config.app.debug);
        // numeric-looking text stays a string where a string is expected
        assert_eq!(config.app.name, "404");
        assert_eq!(config.http.request_timeout_ms, 1500);
        assert_eq!(config.http.cors.allowed_origins, vec!["https://a.example"]);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.settings["mail"]["from"], "noreply@example.com");
    }

    #[test]
    fn test_env_overrides_win_over_files() {
        let config = ConfigLoader::new()
            .with_string("[app]\nenv = \"staging\"", "toml")
            .unwrap()
            .with_env_prefix("TRELLIS")
            .with_env_vars([("TRELLIS__APP__ENV", "production")])
            .load()
            .unwrap();
        assert_eq!(config.app.env, "production");
    }

    #[test]
    fn test_env_invalid_value() {
        let result = ConfigLoader::new()
            .with_env_prefix("TRELLIS")
            .with_env_vars([("TRELLIS__HTTP__REQUEST_TIMEOUT_MS", "soon")])
            .load();
        assert!(matches!(
            result,
            Err(ConfigError::Env { ref var, .. }) if var == "TRELLIS__HTTP__REQUEST_TIMEOUT_MS"
        ));
    }

    #[test]
    fn test_env_unknown_key_rejected() {
        let result = ConfigLoader::new()
            .with_env_prefix("TRELLIS")
            .with_env_vars([("TRELLIS__APP__COLOUR", "blue")])
            .load();
        assert!(matches!(result, Err(ConfigError::Env { .. })));

        let result = ConfigLoader::new()
            .with_env_prefix("TRELLIS")
            .with_env_vars([("TRELLIS__APP____NAME", "x")])
            .load();
        assert!(matches!(result, Err(ConfigError::Env { .. })));
    }

    #[test]
    fn test_merge_replaces_arrays() {
        let mut base = serde_json::json!({ "a": [1, 2], "b": { "c": 1, "d": 2 } });
        merge(&mut base, serde_json::json!({ "a": [3], "b": { "d": 4 } }));
        assert_eq!(base, serde_json::json!({ "a": [3], "b": { "c": 1, "d": 4 } }));
    }

    proptest::proptest! {
        #[test]
        fn prop_env_timeout_roundtrips(timeout in proptest::num::u64::ANY) {
            let config = ConfigLoader::new()
                .with_env_prefix("T")
                .with_env_vars([("T__HTTP__REQUEST_TIMEOUT_MS", timeout.to_string())])
                .load()
                .unwrap();
            proptest::prop_assert_eq!(config.http.request_timeout_ms, timeout);
        }
    }
}
