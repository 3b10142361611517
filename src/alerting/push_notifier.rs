use crate::alerting::{ChannelError, Notification, Notifier, Permission};
use crate::app_config::Notifications;
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode, header};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, instrument, warn};

/// Publishes notifications as JSON to a push server that exposes topics over HTTP, such as ntfy. A
/// phone subscribed to the topic shows them as system notifications.
#[derive(Debug)]
pub struct PushNotifier {
    client: Client,
    server: String,
    topic: String,
    retry_ms: u64,
    retry_max_delay: Duration,
    retry_attempts: usize,
}

pub fn new_client(access_token: Option<&str>) -> Result<Client, PushClientError> {
    let mut headers = header::HeaderMap::new();
    if let Some(access_token) = access_token {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", access_token))?;
        authorization.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, authorization);
    }

    let client = Client::builder().default_headers(headers).timeout(Duration::from_secs(10)).build()?;
    Ok(client)
}

impl PushNotifier {
    pub fn new(client: Client, server: &str, topic: &str, config: &Notifications) -> Self {
        PushNotifier {
            client,
            server: server.trim_end_matches('/').to_string(),
            topic: topic.to_string(),
            retry_ms: config.retry_ms(),
            retry_max_delay: config.retry_max_delay(),
            retry_attempts: config.retry_attempts(),
        }
    }

    async fn publish(&self, notification: &Notification) -> Result<(), ChannelError> {
        let message = PushMessage {
            topic: &self.topic,
            title: &notification.title,
            message: &notification.body,
            priority: priority(notification),
            tags: ["round_pushpin"],
        };
        let response = self.client.post(&self.server).json(&message).send().await?;

        if !response.status().is_success() {
            return Err(ChannelError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

#[derive(Serialize, Debug)]
struct PushMessage<'a> {
    topic: &'a str,
    title: &'a str,
    message: &'a str,
    priority: u8,
    tags: [&'a str; 1],
}

#[async_trait]
impl Notifier for PushNotifier {
    #[instrument(skip_all, fields(topic = %self.topic))]
    async fn request_permission(&self) -> Result<Permission, ChannelError> {
        let response = self.client.get(format!("{}/{}/auth", self.server, self.topic)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(Permission::Granted),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(Permission::Denied),
            status => Err(ChannelError::Rejected(status.as_u16())),
        }
    }

    #[instrument(skip_all, fields(topic = %self.topic))]
    async fn notify(&self, notification: &Notification) -> Result<(), ChannelError> {
        let strategy = ExponentialBackoff::from_millis(self.retry_ms)
            .factor(2)
            .max_delay(self.retry_max_delay)
            .map(jitter)
            .take(self.retry_attempts.saturating_sub(1));

        RetryIf::start(
            strategy,
            || async {
                debug!("📨 Publishing '{}'...", notification.title);
                self.publish(notification).await.inspect_err(|e| warn!("⚠️ Publishing '{}' failed: {}", notification.title, e))
            },
            ChannelError::is_transient,
        )
        .await
    }
}

/// Sound and vibration are not under the sender's control, the priority decides how loudly the
/// receiving phone announces the notification.
fn priority(notification: &Notification) -> u8 {
    match (notification.sound, notification.vibrate) {
        (true, true) => 5,
        (true, false) | (false, true) => 4,
        (false, false) => 2,
    }
}

#[derive(Error, Debug)]
pub enum PushClientError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("push client set an invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
}
