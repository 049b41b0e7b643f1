//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `TRADE_ASSIST` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use trade_assist::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod agents;
mod ai;
mod error;
mod redis;
mod retrieval;
mod routing;
mod server;
mod session;

pub use agents::AgentsConfig;
pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use redis::RedisConfig;
pub use retrieval::RetrievalConfig;
pub use routing::RoutingConfig;
pub use server::{Environment, LogFormat, ServerConfig};
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// offline configuration. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis configuration (session persistence)
    #[serde(default)]
    pub redis: RedisConfig,

    /// LLM and embedding endpoint
    #[serde(default)]
    pub ai: AiConfig,

    /// Session expiry
    #[serde(default)]
    pub session: SessionConfig,

    /// Dispatch chain
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Built-in handler tuning
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Reference corpus
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TRADE_ASSIST` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TRADE_ASSIST__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TRADE_ASSIST__AGENTS__READINESS_THRESHOLD=2` -> `agents.readiness_threshold = 2`
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
                    .prefix("TRADE_ASSIST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
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
        self.redis.validate()?;
        self.ai.validate()?;
        self.session.validate()?;
        self.routing.validate()?;
        self.agents.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
