//! Web push delivery.
//!
//! Posts a JSON payload to the recipient's stored subscription endpoint.
//! This is the simplified push path: payload encryption and VAPID signing
//! are left to a fronting push relay.

use crate::config::PushConfig;
use crate::core::{Channel, ChannelAdapter, Recipient};
use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

/// Title shown by the notification UI.
const PUSH_TITLE: &str = "New books available";

pub struct PushAdapter {
    config: PushConfig,
    client: Client,
}

impl PushAdapter {
    pub fn new(config: PushConfig) -> Self {
        let client = Client::builder()
            .timeout(super::DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    async fn send(&self, endpoint: &str, message: &str) -> Result<()> {
        let payload = json!({
            "title": PUSH_TITLE,
            "body": message,
        });

        let response = self.client.post(endpoint).json(&payload).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            bail!("Push endpoint rejected notification: {}", status);
        }
    }
}

#[async_trait]
impl ChannelAdapter for PushAdapter {
    fn channel(&self) -> Channel {
        Channel::Push
    }

    async fn deliver(&self, recipient: &Recipient, message: &str) -> bool {
        if !self.config.enabled {
            debug!("Web push notifications are not enabled, skipping");
            return false;
        }
        let Some(endpoint) = recipient.push_endpoint.as_deref() else {
            debug!(recipient = %recipient.name, "No push subscription stored, skipping");
            return false;
        };

        match self.send(endpoint, message).await {
            Ok(()) => {
                info!(recipient = %recipient.name, "Push notification sent");
                true
            }
            Err(e) => {
                error!(recipient = %recipient.name, error = %e, "Failed to send push notification");
                false
            }
        }
    }
}
