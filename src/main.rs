//! BookWatch - New-Book Notification Dispatcher
//!
//! Reads "new book" events as JSON lines from stdin (one object per line,
//! e.g. `{"title": "Dune", "authors": ["Frank Herbert"], "book_id": 42}`),
//! batches them over the configured quiet period, and dispatches the batch
//! to every recipient listed in the recipients file.

use anyhow::Result;
use bookwatch::{
    cli::Cli,
    compose::BaseUrlLinkBuilder,
    config::Config,
    core::ChannelAdapter,
    directory::FileDirectory,
    dispatch::Dispatcher,
    notification::{EmailAdapter, PushAdapter, TelegramAdapter, WhatsAppAdapter},
    queue::BatchQueue,
};
use clap::Parser;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// One ingested event, as produced by the upstream pipeline.
#[derive(Debug, Deserialize)]
struct NewBookRecord {
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    book_id: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment,
    // and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("BookWatch starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Quiet Period: {}s", config.quiet_period_seconds);
    info!(
        "External URL: {}",
        config.external_url.as_deref().unwrap_or("Not configured")
    );
    info!("Recipients File: {}", config.recipients_file.display());
    info!(
        "Email Channel: {}",
        if config.email.smtp_host.is_some() {
            "Enabled"
        } else {
            "Not configured"
        }
    );
    info!(
        "WhatsApp Channel: {}",
        if config.whatsapp.api_url.is_some() {
            "Enabled"
        } else {
            "Not configured"
        }
    );
    info!(
        "Telegram Channel: {}",
        if config.telegram.bot_token.is_some() {
            "Enabled"
        } else {
            "Not configured"
        }
    );
    info!(
        "Push Channel: {}",
        if config.push.enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    info!("-------------------------------------------------------");

    let adapters: Vec<Arc<dyn ChannelAdapter>> = vec![
        Arc::new(EmailAdapter::new(config.email.clone())),
        Arc::new(WhatsAppAdapter::new(config.whatsapp.clone())),
        Arc::new(TelegramAdapter::new(config.telegram.clone())),
        Arc::new(PushAdapter::new(config.push.clone())),
    ];
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(FileDirectory::new(config.recipients_file.clone())),
        adapters,
        Arc::new(BaseUrlLinkBuilder::new(config.external_url.clone())),
    ));

    let quiet_period = Duration::from_secs(config.quiet_period_seconds);
    let queue = BatchQueue::new(quiet_period, dispatcher);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<NewBookRecord>(&line) {
            Ok(record) => {
                queue.enqueue_new_book(record.title, record.authors, record.book_id);
            }
            Err(e) => {
                warn!(error = %e, line = %line, "Ignoring malformed event");
            }
        }
    }

    // No early-flush API by design; ride out the debounce window and the
    // dispatch it triggers so the final batch still goes out before the
    // process exits.
    let pending = queue.pending_len();
    if pending > 0 {
        info!(pending, "Input closed, waiting for the final flush");
    } else {
        info!("Input closed, no pending events");
    }
    queue.settle().await;

    Ok(())
}
