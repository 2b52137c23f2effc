//! Replica error taxonomy
//!
//! Per-message failures (undecodable payload, validation rejection, local
//! write failure) drop that message and keep the loop alive. A broker
//! failure terminates the loop for the supervisor to restart.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplicaError {
    /// Subscription-level failure; the receive loop terminates
    #[error("broker subscription failed: {0}")]
    Broker(String),

    /// Payload was not valid JSON
    #[error("payload decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// Payload decoded but failed validation
    #[error("payload rejected: {0}")]
    Validation(#[from] shared::validation::ValidationError),

    /// Local store write or read failed
    #[error("local store error: {0}")]
    Store(#[from] sqlx::Error),
}
