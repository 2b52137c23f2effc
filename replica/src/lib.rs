//! WeatherSync replica
//!
//! Subscribes to the broker channel, validates each snapshot payload, and
//! mirrors the accepted records into a flat local SQLite store.

pub mod config;
pub mod error;
pub mod routes;
pub mod store;
pub mod subscriber;

pub use config::Config;
