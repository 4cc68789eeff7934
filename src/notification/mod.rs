//! Channel adapters for delivering composed messages.
//!
//! Each adapter wraps one provider's send primitive behind the uniform
//! [`crate::core::ChannelAdapter`] capability. Adapters validate their own
//! prerequisites, convert provider errors to a `false` outcome at the
//! boundary, and apply their own bounded I/O timeout so a hung provider
//! cannot stall a flush indefinitely.

pub mod email;
pub mod push;
pub mod telegram;
pub mod whatsapp;

pub use email::EmailAdapter;
pub use push::PushAdapter;
pub use telegram::TelegramAdapter;
pub use whatsapp::WhatsAppAdapter;

use std::time::Duration;

/// Bounded I/O timeout applied by every adapter.
pub(crate) const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);
