//! SMS and push channels over an HTTP delivery gateway

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use uuid::Uuid;

use super::channels::{ChannelSender, Recipient};
use crate::{
    config::GatewayConfig,
    error::{AppError, AppResult},
    models::notification::{Channel, ChannelOutcome, Notification},
};

/// Payload posted to the gateway
#[derive(Debug, Serialize)]
struct GatewayMessage<'a> {
    channel: Channel,
    user_id: Uuid,
    notification_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    title: &'a str,
    message: &'a str,
    data: &'a serde_json::Value,
}

enum Attempt {
    Delivered,
    Transient(String),
    Permanent(String),
}

/// Whether a gateway status is worth retrying
fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub struct GatewaySender {
    channel: Channel,
    config: GatewayConfig,
    client: Client,
}

impl GatewaySender {
    pub fn new(channel: Channel, config: GatewayConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build {} gateway client: {}", channel, e)))?;
        Ok(Self { channel, config, client })
    }

    async fn attempt(&self, url: &str, body: &GatewayMessage<'_>) -> Attempt {
        let mut request = self.client.post(url).json(body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => Attempt::Delivered,
            Ok(response) if is_transient(response.status()) => {
                Attempt::Transient(format!("gateway returned {}", response.status()))
            }
            Ok(response) => Attempt::Permanent(format!("gateway returned {}", response.status())),
            Err(e) => Attempt::Transient(format!("gateway unreachable: {}", e)),
        }
    }
}

#[async_trait]
impl ChannelSender for GatewaySender {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, recipient: &Recipient, notification: &Notification) -> ChannelOutcome {
        let Some(url) = self.config.gateway_url.as_deref() else {
            return ChannelOutcome::skipped(format!("no {} gateway configured", self.channel));
        };
        let to = match self.channel {
            Channel::Sms => match recipient.phone.as_deref() {
                Some(phone) => Some(phone),
                None => return ChannelOutcome::skipped("recipient has no phone number"),
            },
            _ => None,
        };

        let body = GatewayMessage {
            channel: self.channel,
            user_id: notification.user_id,
            notification_id: notification.id,
            to,
            title: &notification.title,
            message: &notification.message,
            data: &notification.data,
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 0..max_attempts {
            match self.attempt(url, &body).await {
                Attempt::Delivered => return ChannelOutcome::Delivered,
                Attempt::Permanent(reason) => return ChannelOutcome::failed(reason),
                Attempt::Transient(reason) => {
                    tracing::debug!(
                        "{} delivery attempt {}/{} failed: {}",
                        self.channel,
                        attempt + 1,
                        max_attempts,
                        reason
                    );
                    last_error = reason;
                    if attempt + 1 < max_attempts {
                        let delay = self.config.initial_backoff_ms.saturating_mul(1 << attempt.min(16));
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        ChannelOutcome::failed(format!("{} after {} attempts", last_error, max_attempts))
    }
}
