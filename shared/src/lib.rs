//! Shared types for the WeatherSync pipeline
//!
//! This crate contains the canonical snapshot model, the channel payload
//! codec, and the validation routines shared between the ingestor (master)
//! and the replica (slave) binaries.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::*;
