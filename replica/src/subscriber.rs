//! Broker subscription and the replica receive loop
//!
//! Messages are processed strictly one at a time in arrival order. A message
//! that fails to decode, validate, or persist is dropped with a log line; a
//! broker failure ends the loop so the supervisor can restart the process.

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::error::ReplicaError;
use crate::store::LocalStore;
use shared::validation::normalize;

/// Ordered message source the receive loop drains
#[async_trait]
pub trait Subscription: Send {
    /// Next payload in arrival order; `None` when the stream has ended
    async fn next_message(&mut self) -> Result<Option<String>, ReplicaError>;
}

/// Subscription over the broker's pub/sub channel
pub struct RedisSubscription {
    pubsub: redis::aio::PubSub,
}

impl RedisSubscription {
    /// Connect and subscribe to `channel`
    pub async fn connect(url: &str, channel: &str) -> Result<Self, ReplicaError> {
        let client = redis::Client::open(url).map_err(|e| ReplicaError::Broker(e.to_string()))?;
        let conn = client
            .get_async_connection()
            .await
            .map_err(|e| ReplicaError::Broker(e.to_string()))?;
        let mut pubsub = conn.into_pubsub();
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| ReplicaError::Broker(e.to_string()))?;

        tracing::info!(channel, "subscribed to broker channel");
        Ok(Self { pubsub })
    }
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next_message(&mut self) -> Result<Option<String>, ReplicaError> {
        let Some(message) = self.pubsub.on_message().next().await else {
            return Ok(None);
        };
        let payload = message
            .get_payload::<String>()
            .map_err(|e| ReplicaError::Broker(e.to_string()))?;
        Ok(Some(payload))
    }
}

/// Drain the subscription into the local store
///
/// Returns `Ok(messages_accepted)` when the stream ends cleanly, `Err` on a
/// broker failure. Per-message failures never propagate.
pub async fn run_subscriber(
    mut subscription: impl Subscription,
    store: &LocalStore,
) -> Result<u64, ReplicaError> {
    let mut accepted = 0u64;

    while let Some(payload) = subscription.next_message().await? {
        match apply_message(store, &payload).await {
            Ok(id) => {
                accepted += 1;
                tracing::info!(id, "record replicated");
            }
            Err(error) => {
                tracing::warn!(error = %error, "message dropped");
            }
        }
    }

    tracing::info!(accepted, "subscription stream ended");
    Ok(accepted)
}

/// Decode, validate, and persist one payload
async fn apply_message(store: &LocalStore, payload: &str) -> Result<i64, ReplicaError> {
    let raw: serde_json::Value = serde_json::from_str(payload)?;
    let record = normalize(&raw)?;
    store.insert(&record).await
}
