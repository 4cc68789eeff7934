//! BookWatch - A debounced, multi-channel new-book notification dispatcher
//!
//! This library accumulates "new book available" events, coalesces them over
//! a quiet period, and fans them out to every interested recipient across
//! email, WhatsApp, Telegram, and web push.

pub mod cli;
pub mod compose;
pub mod config;
pub mod core;
pub mod directory;
pub mod dispatch;
pub mod notification;
pub mod queue;

// Re-export core types for convenience
pub use crate::core::*;
