//! Configuration management for BookWatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer defaults, a `bookwatch.toml` file, `BOOKWATCH_`-prefixed
//! environment variables, and command-line arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default debounce quiet period in seconds.
const DEFAULT_QUIET_PERIOD_SECS: u64 = 300;

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Seconds of silence after the last event before a batch is flushed.
    pub quiet_period_seconds: u64,
    /// External base URL used to build book deep links; links are omitted
    /// when unset.
    pub external_url: Option<String>,
    /// Path to the JSON file listing recipients and their preferences.
    pub recipients_file: PathBuf,
    /// Configuration for the email channel.
    pub email: EmailConfig,
    /// Configuration for the WhatsApp channel.
    pub whatsapp: WhatsAppConfig,
    /// Configuration for the Telegram channel.
    pub telegram: TelegramConfig,
    /// Configuration for the web push channel.
    pub push: PushConfig,
}

/// Configuration for the email channel. The channel is skipped entirely
/// while `smtp_host` is unset.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Subject line for notification emails.
    pub subject: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            from_address: "noreply@bookwatch.local".to_string(),
            subject: "New books available".to_string(),
        }
    }
}

/// Configuration for the WhatsApp channel (Evolution API). All three fields
/// must be set for the channel to be active.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WhatsAppConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub instance: Option<String>,
}

/// Configuration for the Telegram channel.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    /// Bot API base URL, overridable for tests.
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

/// Configuration for the web push channel.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PushConfig {
    pub enabled: bool,
}

impl Config {
    /// Loads the application configuration by layering sources: defaults,
    /// TOML file, environment, and CLI arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from("bookwatch.toml"));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // Allow overriding with environment variables, e.g.
            // BOOKWATCH_QUIET_PERIOD_SECONDS=60
            .merge(Env::prefixed("BOOKWATCH_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            quiet_period_seconds: DEFAULT_QUIET_PERIOD_SECS,
            external_url: None,
            recipients_file: PathBuf::from("recipients.json"),
            email: EmailConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            telegram: TelegramConfig::default(),
            push: PushConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layered(toml: &str, cli: Cli) -> Config {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml))
            .merge(cli)
            .extract()
            .unwrap()
    }

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.quiet_period_seconds, 300);
        assert!(config.external_url.is_none());
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert!(!config.push.enabled);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = layered(
            r#"
                quiet_period_seconds = 60
                external_url = "https://library.example.com"

                [telegram]
                bot_token = "123:ABC"
            "#,
            Cli {
                config: None,
                quiet_period: None,
            },
        );
        assert_eq!(config.quiet_period_seconds, 60);
        assert_eq!(
            config.external_url.as_deref(),
            Some("https://library.example.com")
        );
        assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
        // Untouched sections keep their defaults.
        assert_eq!(config.email.smtp_port, 587);
    }

    #[test]
    fn cli_overrides_toml() {
        let config = layered(
            "quiet_period_seconds = 60",
            Cli {
                config: None,
                quiet_period: Some(10),
            },
        );
        assert_eq!(config.quiet_period_seconds, 10);
    }
}
