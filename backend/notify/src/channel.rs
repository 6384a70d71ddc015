use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::NotifyError;

pub const PLACEHOLDER_WEBHOOK_URL: &str = "YOUR_WEBHOOK_URL_HERE";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str, channel: &str) -> Result<(), NotifyError>;
}

fn ensure_content(message: &str) -> Result<(), NotifyError> {
    if message.trim().is_empty() {
        return Err(NotifyError::NoContent);
    }

    Ok(())
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts to a Discord style webhook. The url already pins the channel.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: impl Into<String>) -> Result<Self, NotifyError> {
        let url = url.into();

        if url.trim().is_empty() || url == PLACEHOLDER_WEBHOOK_URL {
            return Err(NotifyError::Misconfigured(format!(
                "replace '{PLACEHOLDER_WEBHOOK_URL}' with your actual webhook url"
            )));
        }

        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &str, channel: &str) -> Result<(), NotifyError> {
        ensure_content(message)?;

        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status));
        }

        debug!("Webhook accepted message for {channel} with {status}");
        Ok(())
    }
}

#[derive(Serialize)]
struct BusMessage<'a> {
    message: &'a str,
    channel: &'a str,
}

/// Publishes on a Redis topic, a bot on the other side posts it into `channel`.
pub struct RedisNotifier {
    connection: ConnectionManager,
    topic: String,
}

impl RedisNotifier {
    pub fn new(connection: ConnectionManager, topic: impl Into<String>) -> Self {
        Self {
            connection,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn send(&self, message: &str, channel: &str) -> Result<(), NotifyError> {
        ensure_content(message)?;

        let payload = serde_json::to_string(&BusMessage { message, channel })?;

        let mut connection = self.connection.clone();
        let receivers: usize = connection.publish(&self.topic, payload).await?;

        debug!("Published message on {} to {receivers} subscribers", self.topic);
        Ok(())
    }
}

/// Notifications disabled, keeps the message in the logs.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str, channel: &str) -> Result<(), NotifyError> {
        ensure_content(message)?;

        info!(channel, "Notification (not delivered):\n{message}");
        Ok(())
    }
}
