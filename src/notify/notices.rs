//! Message templates and delivery for fleet events.

use crate::notify::{Channel, Notifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Texts sent on fleet events. `{server}` expands to the server id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Broadcast when a rotation is requested
    pub scheduled: String,
    /// Broadcast right before the old container is stopped
    pub starting: String,
    /// Broadcast after the new container survived its window
    pub complete: String,
    /// Broadcast on a fatal failure
    pub failed: String,
    /// Admin text on a fatal failure; `{reason}` expands to the cause
    pub fatal_admin: String,
    /// Console broadcast right before a rotation runs
    pub ingame_rotation: String,
    /// Console broadcast when a rotation is requested
    pub ingame_schedule: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            scheduled: "A new season is scheduled for server {server}.".to_string(),
            starting: "Server {server} is switching to a new season.".to_string(),
            complete: "Server {server} is up on its new season.".to_string(),
            failed: "Server {server} failed to come back after a season change.".to_string(),
            fatal_admin: "Server {server} is down: {reason}".to_string(),
            ingame_rotation: "The server is switching to a new season now!".to_string(),
            ingame_schedule: "The server will switch to a new season at the scheduled time!"
                .to_string(),
        }
    }
}

fn render(template: &str, server_id: &str) -> String {
    template.replace("{server}", server_id)
}

/// Sends the fleet's notifications.
///
/// Delivery failures are logged and dropped; a broken webhook never changes
/// the outcome of the operation that triggered it.
#[derive(Clone)]
pub struct Notices {
    notifier: Arc<dyn Notifier>,
    messages: Messages,
}

impl Notices {
    pub fn new(notifier: Arc<dyn Notifier>, messages: Messages) -> Self {
        Self { notifier, messages }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub async fn rotation_scheduled(&self, server_id: &str) {
        self.deliver(Channel::Broadcast, render(&self.messages.scheduled, server_id))
            .await;
    }

    pub async fn rotation_starting(&self, server_id: &str) {
        self.deliver(Channel::Broadcast, render(&self.messages.starting, server_id))
            .await;
    }

    pub async fn rotation_complete(&self, server_id: &str) {
        self.deliver(Channel::Broadcast, render(&self.messages.complete, server_id))
            .await;
    }

    /// A step failed but the surrounding operation carries on.
    pub async fn non_fatal(&self, server_id: &str, step: &str, error: &str) {
        self.deliver(
            Channel::Admin,
            format!("[{}] {} failed: {}", server_id, step, error),
        )
        .await;
    }

    /// The server is presumed dead: broadcast the failure, tell admins why.
    pub async fn fatal(&self, server_id: &str, reason: &str) {
        self.deliver(Channel::Broadcast, render(&self.messages.failed, server_id))
            .await;
        self.deliver(
            Channel::Admin,
            render(&self.messages.fatal_admin, server_id).replace("{reason}", reason),
        )
        .await;
    }

    /// Console line announcing an imminent rotation.
    pub fn ingame_rotation(&self) -> &str {
        &self.messages.ingame_rotation
    }

    /// Console line announcing a scheduled rotation.
    pub fn ingame_schedule(&self) -> &str {
        &self.messages.ingame_schedule
    }

    async fn deliver(&self, channel: Channel, message: String) {
        if let Err(e) = self.notifier.send(channel, &message).await {
            warn!("Failed to send {} notification: {}", channel, e);
        }
    }
}
