//! Configuration management for the WeatherSync ingestor
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with WSYNC_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Main application configuration, read once at startup
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Liveness server configuration
    pub server: ServerConfig,

    /// Durable category store configuration
    pub database: DatabaseConfig,

    /// Weather provider configuration
    pub provider: ProviderConfig,

    /// Pub/sub broker configuration
    pub broker: BrokerConfig,

    /// Ingestion scheduler configuration
    pub scheduler: SchedulerConfig,

    /// Alarm manager configuration
    pub alarm: AlarmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// How long a caller blocks waiting for a free connection before
    /// the acquisition fails
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Pool builder: callers beyond `max_connections` queue up to the
    /// acquire timeout rather than failing immediately
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// One Call API endpoint
    pub api_endpoint: String,

    /// Provider API key
    pub api_key: String,

    /// Target coordinates
    pub latitude: f64,
    pub longitude: f64,

    /// Location name attached to every snapshot (the provider echoes
    /// only coordinates)
    pub city: String,

    /// Unit system passed to the provider (metric/imperial/standard)
    pub units: String,

    /// Language code passed to the provider
    pub lang: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrokerConfig {
    /// Broker connection URL
    pub url: String,

    /// Channel carrying the serialized snapshots
    pub channel: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Fixed ingestion interval in seconds
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlarmConfig {
    /// SMS gateway endpoint
    pub sms_api_url: String,

    /// Recipient phone numbers
    #[serde(default)]
    pub recipients: Vec<String>,

    /// Configured rules; empty means use the built-in defaults
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// One alert rule as it appears in configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RuleConfig {
    pub name: String,

    /// temp_increase | temp_decrease | extreme_weather
    pub kind: String,

    /// Temperature delta threshold in degrees, for the temp kinds
    pub threshold: Option<f64>,

    /// Condition texts, for the extreme_weather kind
    #[serde(default)]
    pub conditions: Vec<String>,

    /// Message template with {city}/{delta}/{weather} placeholders
    pub message: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("WSYNC_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default(
                "provider.api_endpoint",
                "https://api.openweathermap.org/data/3.0/onecall",
            )?
            .set_default("provider.units", "metric")?
            .set_default("provider.lang", "zh_cn")?
            .set_default("provider.city", "Beijing")?
            .set_default("broker.url", "redis://127.0.0.1:6379")?
            .set_default("broker.channel", "weather_updates")?
            .set_default("scheduler.interval_secs", 60)?
            .set_default("alarm.sms_api_url", "http://your-sms-api.com/send")?
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
