//! Configuration management for the WeatherSync replica
//!
//! Same layering as the ingestor: defaults in code, then an
//! environment-specific file, then WSYNC_ prefixed environment variables.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Liveness server configuration
    pub server: ServerConfig,

    /// Pub/sub broker configuration
    pub broker: BrokerConfig,

    /// Local store configuration
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrokerConfig {
    /// Broker connection URL
    pub url: String,

    /// Channel carrying the serialized snapshots
    pub channel: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// SQLite database file path
    pub path: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("WSYNC_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("broker.url", "redis://127.0.0.1:6379")?
            .set_default("broker.channel", "weather_updates")?
            .set_default("store.path", "weather_replica.db")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WSYNC_ prefix)
            .add_source(
                Environment::with_prefix("WSYNC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
