//! WhatsApp delivery via the Evolution API.
//!
//! Sends text messages through `POST {api_url}/message/sendText/{instance}`
//! authenticated with an `apikey` header. The API reports success with
//! either 200 or 201.

use crate::config::WhatsAppConfig;
use crate::core::{Channel, ChannelAdapter, Recipient};
use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

pub struct WhatsAppAdapter {
    config: WhatsAppConfig,
    client: Client,
}

impl WhatsAppAdapter {
    pub fn new(config: WhatsAppConfig) -> Self {
        let client = Client::builder()
            .timeout(super::DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    async fn send(
        &self,
        api_url: &str,
        api_key: &str,
        instance: &str,
        phone_number: &str,
        message: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/message/sendText/{}",
            api_url.trim_end_matches('/'),
            instance
        );
        let payload = json!({
            "number": normalize_number(phone_number),
            "textMessage": { "text": message },
        });

        let response = self
            .client
            .post(&url)
            .header("apikey", api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 200 || status.as_u16() == 201 {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            bail!("Evolution API rejected message: {} - {}", status, body);
        }
    }
}

/// Strips everything but digits and drops the leading `+`, yielding the
/// international format the Evolution API expects.
fn normalize_number(phone_number: &str) -> String {
    phone_number.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[async_trait]
impl ChannelAdapter for WhatsAppAdapter {
    fn channel(&self) -> Channel {
        Channel::WhatsApp
    }

    async fn deliver(&self, recipient: &Recipient, message: &str) -> bool {
        let Some(phone_number) = recipient.phone_number.as_deref() else {
            debug!(recipient = %recipient.name, "No phone number configured, skipping");
            return false;
        };
        let (Some(api_url), Some(api_key), Some(instance)) = (
            self.config.api_url.as_deref(),
            self.config.api_key.as_deref(),
            self.config.instance.as_deref(),
        ) else {
            debug!("Evolution API credentials not configured, skipping WhatsApp channel");
            return false;
        };

        match self.send(api_url, api_key, instance, phone_number, message).await {
            Ok(()) => {
                info!(recipient = %recipient.name, "WhatsApp notification sent");
                true
            }
            Err(e) => {
                error!(recipient = %recipient.name, error = %e, "Failed to send WhatsApp notification");
                false
            }
        }
    }
}
