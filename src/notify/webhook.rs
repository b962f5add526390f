use crate::notify::{Channel, NotificationConfig, Notifier, NotifyError, Result, truncate_message};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Posts `{"content": message}` to a per-channel webhook URL.
///
/// A channel without a URL is skipped with a debug log.
pub struct WebhookNotifier {
    client: reqwest::Client,
    config: NotificationConfig,
}

impl WebhookNotifier {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: NotificationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, channel: Channel) -> Option<&Url> {
        match channel {
            Channel::Admin => self.config.admin_webhook.as_ref(),
            Channel::Broadcast => self.config.broadcast_webhook.as_ref(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, channel: Channel, message: &str) -> Result<()> {
        let Some(url) = self.url(channel) else {
            debug!("No webhook for {} channel, dropping: {}", channel, message);
            return Ok(());
        };

        let content = truncate_message(message, self.config.max_message_len);
        let response = self
            .client
            .post(url.clone())
            .json(&json!({ "content": content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                channel,
                status: status.as_u16(),
            });
        }

        debug!("Delivered {} notification", channel);
        Ok(())
    }
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, channel: Channel, message: &str) -> Result<()> {
        info!("[{}] {}", channel, message);
        Ok(())
    }
}
