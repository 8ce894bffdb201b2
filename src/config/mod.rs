//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `ROOMCAST` prefix and nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use roomcast::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod error;
mod server;

pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every field has a working default, so the server starts with no
/// environment at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, static assets)
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `ROOMCAST` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ROOMCAST__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ROOMCAST__SERVER__STATIC_DIR=./www` -> `server.static_dir = ./www`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ROOMCAST")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("ROOMCAST__SERVER__PORT");
        env::remove_var("ROOMCAST__SERVER__ENVIRONMENT");
        env::remove_var("ROOMCAST__SERVER__STATIC_DIR");
    }

    #[test]
    fn load_succeeds_with_no_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn custom_server_port_is_read() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ROOMCAST__SERVER__PORT", "8080");
        let result = AppConfig::load();
        clear_env();

        assert_eq!(result.unwrap().server.port, 8080);
    }

    #[test]
    fn production_environment_is_read() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ROOMCAST__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn custom_static_dir_is_read() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ROOMCAST__SERVER__STATIC_DIR", "./www");
        let result = AppConfig::load();
        clear_env();

        assert_eq!(result.unwrap().server.static_dir, "./www");
    }
}
