//! Outbound notifications.
//!
//! Two logical channels exist: a low-traffic admin channel for failures and
//! a broadcast channel for season state changes. [`Notifier`] is the sink;
//! [`Notices`] renders the fleet's messages and never lets a failed
//! delivery reach the caller.

mod notices;
mod webhook;

pub use notices::{Messages, Notices};
pub use webhook::{LogNotifier, WebhookNotifier};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Default cap on message length, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 2000;

/// Notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Failures, read by operators
    Admin,
    /// Season state changes, read by players
    Broadcast,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Admin => write!(f, "admin"),
            Channel::Broadcast => write!(f, "broadcast"),
        }
    }
}

/// Notification delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook for {channel} channel returned HTTP {status}")]
    Rejected { channel: Channel, status: u16 },
}

pub type Result<T> = std::result::Result<T, NotifyError>;

/// A message sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel: Channel, message: &str) -> Result<()>;
}

/// Webhook endpoints and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub admin_webhook: Option<Url>,
    pub broadcast_webhook: Option<Url>,
    pub max_message_len: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            admin_webhook: None,
            broadcast_webhook: None,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

/// Build the notifier described by `config`.
///
/// Without any webhook URL, messages only go to the log.
pub fn from_config(config: &NotificationConfig) -> Result<Arc<dyn Notifier>> {
    if config.admin_webhook.is_none() && config.broadcast_webhook.is_none() {
        return Ok(Arc::new(LogNotifier));
    }
    Ok(Arc::new(WebhookNotifier::new(config.clone())?))
}

/// Cut `message` down to at most `max_len` characters.
pub fn truncate_message(message: &str, max_len: usize) -> &str {
    match message.char_indices().nth(max_len) {
        Some((byte_index, _)) => &message[..byte_index],
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_message() {
        assert_eq!(truncate_message("hello", 10), "hello");
        assert_eq!(truncate_message("hello", 5), "hello");
        assert_eq!(truncate_message("hello", 3), "hel");

        let long = "x".repeat(2500);
        assert_eq!(truncate_message(&long, DEFAULT_MAX_MESSAGE_LEN).len(), 2000);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_message("伺服器要換包", 3), "伺服器");
    }

    #[test]
    fn test_default_config() {
        let config = NotificationConfig::default();
        assert!(config.admin_webhook.is_none());
        assert_eq!(config.max_message_len, 2000);
    }
}
