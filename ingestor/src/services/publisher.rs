//! Snapshot publisher
//!
//! Serializes the full canonical snapshot and emits it on the configured
//! broker channel. Delivery is at-most-once and non-durable: a publish with
//! zero connected subscribers succeeds and the message is simply lost.

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::error::PublishError;
use shared::models::{encode_payload, WeatherSnapshot};

/// Fan-out seam used by the scheduler
#[async_trait]
pub trait SnapshotPublisher: Send + Sync {
    async fn publish(&self, snapshot: &WeatherSnapshot) -> Result<(), PublishError>;
}

/// Publisher over the key-value broker's pub/sub channel
///
/// One handle per process; not pooled.
#[derive(Clone)]
pub struct RedisPublisher {
    client: redis::Client,
    channel: String,
}

impl RedisPublisher {
    pub fn new(url: &str, channel: String) -> Result<Self, PublishError> {
        let client = redis::Client::open(url).map_err(|e| PublishError::Broker(e.to_string()))?;
        Ok(Self { client, channel })
    }
}

#[async_trait]
impl SnapshotPublisher for RedisPublisher {
    async fn publish(&self, snapshot: &WeatherSnapshot) -> Result<(), PublishError> {
        let payload = encode_payload(snapshot)?;

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?;

        // The broker reports how many subscribers received the message;
        // at-most-once delivery means zero is still success.
        let receivers: i64 = conn
            .publish(&self.channel, &payload)
            .await
            .map_err(|e| PublishError::Broker(e.to_string()))?;

        tracing::info!(
            channel = %self.channel,
            receivers,
            bytes = payload.len(),
            "snapshot published"
        );

        Ok(())
    }
}
