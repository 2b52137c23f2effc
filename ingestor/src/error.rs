//! Error taxonomy for the ingestion pipeline
//!
//! Every family is non-fatal to the process: provider errors are retried
//! implicitly by the next cycle, persistence errors are isolated per
//! category, publish and notify errors are logged only.

use thiserror::Error;

/// Failure fetching or decoding a provider response
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network-level failure: timeout, DNS, connection refused, non-2xx
    #[error("provider request failed: {0}")]
    Transport(String),

    /// HTTP 429 from the provider
    #[error("provider rate limited")]
    RateLimited,

    /// Response parsed but is structurally incomplete, or did not parse
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Classified failure of a single category write
#[derive(Debug, Error)]
pub enum PersistError {
    /// Retryable: network, pool exhaustion, broken connection
    #[error("database connection failure: {0}")]
    ConnectionFailure(String),

    /// Fatal to the operator, not the process: field mapping is wrong
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Data quality issue: drop the records and log
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

impl PersistError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PersistError::ConnectionFailure(_))
    }
}

impl From<sqlx::Error> for PersistError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                // SQLSTATE class 23 = integrity constraint violation,
                // class 42 = syntax error or access rule violation
                let code = db.code().map(|c| c.to_string()).unwrap_or_default();
                if code.starts_with("23") {
                    PersistError::ConstraintViolation(db.to_string())
                } else if code.starts_with("42") {
                    PersistError::SchemaMismatch(db.to_string())
                } else {
                    PersistError::ConnectionFailure(db.to_string())
                }
            }
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => PersistError::SchemaMismatch(err.to_string()),
            sqlx::Error::Decode(_) => PersistError::SchemaMismatch(err.to_string()),
            _ => PersistError::ConnectionFailure(err.to_string()),
        }
    }
}

/// Failure emitting a snapshot on the broker channel; always non-fatal
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("broker publish failed: {0}")]
    Broker(String),
}

/// Failure delivering a notification to the SMS gateway
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("sms gateway request failed: {0}")]
    Gateway(String),

    #[error("sms gateway rejected message: status {0}")]
    Rejected(u16),
}
