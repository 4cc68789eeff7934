//! Telegram delivery via the Bot API (`POST /bot<token>/sendMessage`).

use crate::config::TelegramConfig;
use crate::core::{Channel, ChannelAdapter, Recipient};
use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

pub struct TelegramAdapter {
    config: TelegramConfig,
    client: Client,
}

impl TelegramAdapter {
    pub fn new(config: TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(super::DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    async fn send(&self, bot_token: &str, chat_id: &str, message: &str) -> Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            bot_token
        );
        let payload = json!({
            "chat_id": chat_id,
            "text": message,
            "parse_mode": "HTML",
            "disable_web_page_preview": false,
        });

        let response = self.client.post(&url).json(&payload).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            bail!("Telegram sendMessage failed: {} - {}", status, body);
        }
    }
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn channel(&self) -> Channel {
        Channel::Telegram
    }

    async fn deliver(&self, recipient: &Recipient, message: &str) -> bool {
        let Some(chat_id) = recipient.telegram_chat_id.as_deref() else {
            debug!(recipient = %recipient.name, "No Telegram chat ID configured, skipping");
            return false;
        };
        let Some(bot_token) = self.config.bot_token.as_deref() else {
            debug!("Telegram bot token not configured, skipping Telegram channel");
            return false;
        };

        match self.send(bot_token, chat_id, message).await {
            Ok(()) => {
                info!(recipient = %recipient.name, "Telegram notification sent");
                true
            }
            Err(e) => {
                error!(recipient = %recipient.name, error = %e, "Failed to send Telegram notification");
                false
            }
        }
    }
}
