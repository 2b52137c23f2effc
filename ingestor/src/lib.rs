//! WeatherSync ingestor
//!
//! Fetches provider snapshots on a fixed interval, persists each telemetry
//! category into its own table, fans the full snapshot out over the broker
//! channel, and evaluates the configured alert rules.

pub mod config;
pub mod error;
pub mod external;
pub mod services;

pub use config::Config;
