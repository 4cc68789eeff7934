//! Core domain types and service traits for BookWatch
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A "new book available" event queued for batched delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookEvent {
    /// Title of the new book.
    pub title: String,
    /// Author names in display order.
    pub authors: Vec<String>,
    /// Library identifier of the book, used to build a deep link.
    pub book_id: Option<i64>,
    /// When the event entered the queue.
    pub enqueued_at: DateTime<Utc>,
}

impl BookEvent {
    /// Creates a new event stamped with the current time.
    pub fn new(title: impl Into<String>, authors: Vec<String>, book_id: Option<i64>) -> Self {
        Self {
            title: title.into(),
            authors,
            book_id,
            enqueued_at: Utc::now(),
        }
    }
}

/// A delivery channel a recipient can opt into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    WhatsApp,
    Telegram,
    Push,
}

impl Channel {
    /// A short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::WhatsApp => "whatsapp",
            Channel::Telegram => "telegram",
            Channel::Push => "push",
        }
    }
}

/// A recipient with their notification preferences, as supplied by the
/// external directory. Read-only to this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipient {
    pub id: i64,
    pub name: String,
    /// Mail address, required by the email channel.
    #[serde(default)]
    pub email: Option<String>,
    /// International phone number, required by the WhatsApp channel.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Telegram chat identifier, required by the Telegram channel.
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
    /// Web push subscription endpoint, required by the push channel.
    #[serde(default)]
    pub push_endpoint: Option<String>,
    /// Channels this recipient has enabled for new-book notifications.
    #[serde(default)]
    pub channels: Vec<Channel>,
    /// Anonymous/system accounts never receive notifications.
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Per-flush delivery tally, used only for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Number of (recipient, channel) pairs attempted.
    pub attempted: usize,
    /// Number of attempts that reported success.
    pub delivered: usize,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Delivers a composed message to one recipient over one channel.
///
/// Implementations validate their own prerequisites (recipient address
/// present, provider credentials configured) and return `false` without
/// raising when they are unmet. Provider and network errors are caught and
/// logged inside the adapter; nothing propagates past `deliver`.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// The channel this adapter serves.
    fn channel(&self) -> Channel;

    /// Attempts delivery. `true` means the provider accepted the message.
    async fn deliver(&self, recipient: &Recipient, message: &str) -> bool;
}

/// Lists all recipients with their notification preferences.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Returns every known recipient. A failure here aborts the whole
    /// flush's dispatch (the recipient list is shared state).
    async fn list_recipients(&self) -> Result<Vec<Recipient>>;
}

/// Builds an externally reachable deep link for a book.
pub trait LinkBuilder: Send + Sync {
    /// Returns `None` when no external URL can be built; the composer
    /// treats that as omission, not an error.
    fn book_url(&self, book_id: i64) -> Option<String>;
}
