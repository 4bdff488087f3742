//! Typed configuration for Trellis applications.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → files → env)
//!
//! # Overview
//!
//! [`AppConfig`] holds the typed sections:
//!
//! - [`AppSection`] - name, environment, debug flag, base path
//! - [`RoutingSection`] - handler resolution and default namespace
//! - [`HttpSection`] - request deadline, request ids, CORS
//! - [`LoggingSection`] - log filter and format
//! - `settings` - free-form application values
//!
//! [`Config`] is a read-only view addressing every value by dotted key.
//! Configuration is passed to the application explicitly; there is no
//! global instance.
//!
//! # Example
//!
//! ```no_run
//! use trellis_config::{Config, ConfigLoader};
//!
//! # fn main() -> Result<(), trellis_config::ConfigError> {
//! let config = Config::new(
//!     ConfigLoader::new()
//!         .with_optional_file("config/app.toml")?
//!         .with_env_prefix("TRELLIS")
//!         .load()?,
//! )?;
//!
//! let debug: bool = config.get_as("app.debug")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [app]
//! name = "blog"
//! env = "production"
//! debug = false
//! base_path = "/blog"
//!
//! [routing]
//! lazy_handlers = true
//! default_namespace = "app::controllers::"
//!
//! [http]
//! request_timeout_ms = 10000
//! trust_request_id = true
//!
//! [http.cors]
//! allowed_origins = ["https://blog.example.com"]
//! allow_credentials = true
//!
//! [logging]
//! level = "info,trellis_routing=debug"
//! format = "json"
//!
//! [settings.mail]
//! from = "noreply@blog.example.com"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Any value can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `TRELLIS__APP__DEBUG=true`
//! - `TRELLIS__HTTP__REQUEST_TIMEOUT_MS=5000`
//! - `TRELLIS__HTTP__CORS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{AppConfig, Config};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AppSection, CorsSection, HttpSection, LoggingSection, RoutingSection};
