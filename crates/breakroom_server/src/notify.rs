//! Notification collaborator: pushes messages back to the chat platform.

use crate::error::NotifyError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Delivers a message payload to a channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `payload` to `channel`; `Ok` only when delivery was confirmed.
    async fn notify(&self, channel: &str, payload: &serde_json::Value) -> Result<(), NotifyError>;
}

/// [`Notifier`] that POSTs JSON to a webhook URL such as a response URL.
///
/// Delivery counts as confirmed on a success status unless the body is JSON
/// with `"ok": false`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Creates a notifier whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, payload))]
    async fn notify(&self, channel: &str, payload: &serde_json::Value) -> Result<(), NotifyError> {
        let response = self.client.post(channel).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(%status, %body, "Webhook refused message");
            return Err(NotifyError::new(format!("Webhook answered {}: {}", status, body)));
        }
        let reported_failure = serde_json::from_str::<serde_json::Value>(&body)
            .map(|json| json.get("ok") == Some(&serde_json::Value::Bool(false)))
            .unwrap_or(false);
        if reported_failure {
            warn!(%body, "Webhook reported failure");
            return Err(NotifyError::new(format!("Webhook reported failure: {}", body)));
        }
        debug!(%status, "Message delivered");
        Ok(())
    }
}
