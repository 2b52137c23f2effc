//! SMS gateway client
//!
//! Delivery confirmation is not surfaced back into the rule engine; a failed
//! send is logged by the caller and nothing else happens.

use async_trait::async_trait;
use serde_json::json;

use crate::error::NotifyError;

/// Outbound notification seam for the alarm manager
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipients: &[String], message: &str) -> Result<(), NotifyError>;
}

/// SMS sender against a simple JSON gateway
#[derive(Clone)]
pub struct SmsSender {
    http_client: reqwest::Client,
    api_url: String,
}

impl SmsSender {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url,
        }
    }
}

#[async_trait]
impl Notifier for SmsSender {
    async fn send(&self, recipients: &[String], message: &str) -> Result<(), NotifyError> {
        tracing::info!(recipients = ?recipients, message, "sending sms notification");

        let response = self
            .http_client
            .post(&self.api_url)
            .json(&json!({
                "phone_numbers": recipients,
                "message": message,
            }))
            .send()
            .await
            .map_err(|e| NotifyError::Gateway(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        Ok(())
    }
}
