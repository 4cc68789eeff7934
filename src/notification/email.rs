//! Email delivery over async SMTP.

use crate::config::EmailConfig;
use crate::core::{Channel, ChannelAdapter, Recipient};
use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, error, info};

/// Sends the composed message as a plain-text email via the configured
/// SMTP relay.
pub struct EmailAdapter {
    config: EmailConfig,
}

impl EmailAdapter {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    async fn send(&self, smtp_host: &str, to_email: &str, message: &str) -> Result<()> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject(&self.config.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.to_string())?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)?
            .port(self.config.smtp_port)
            .timeout(Some(super::DELIVERY_TIMEOUT));

        if let (Some(user), Some(pass)) = (&self.config.smtp_username, &self.config.smtp_password)
        {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        builder.build().send(email).await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for EmailAdapter {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn deliver(&self, recipient: &Recipient, message: &str) -> bool {
        let Some(to_email) = recipient.email.as_deref() else {
            debug!(recipient = %recipient.name, "No email address configured, skipping");
            return false;
        };
        let Some(smtp_host) = self.config.smtp_host.as_deref() else {
            debug!("SMTP relay not configured, skipping email channel");
            return false;
        };

        match self.send(smtp_host, to_email, message).await {
            Ok(()) => {
                info!(recipient = %recipient.name, "Email notification sent");
                true
            }
            Err(e) => {
                error!(recipient = %recipient.name, error = %e, "Failed to send email notification");
                false
            }
        }
    }
}
