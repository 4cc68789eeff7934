//! The fan-out dispatch loop.
//!
//! On flush, the dispatcher composes the batch message once, resolves all
//! recipients once, and drives the channel adapters per (recipient, channel)
//! pair. Failures are isolated per pair; only a directory fault aborts the
//! whole flush, since the recipient list is shared by every delivery.

use crate::compose;
use crate::core::{
    BookEvent, Channel, ChannelAdapter, DispatchOutcome, LinkBuilder, RecipientDirectory,
};
use crate::directory::resolve_recipients;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Consumes a flushed batch. The queue only depends on this trait, which
/// keeps its timer logic testable without any delivery machinery.
#[async_trait]
pub trait BatchDispatch: Send + Sync {
    /// Delivers the batch, returning the number of successful deliveries.
    /// Must not panic or return an error; the timer task has no way to
    /// recover from either.
    async fn dispatch(&self, batch: Vec<BookEvent>) -> usize;
}

/// Fans a flushed batch out to every interested recipient.
pub struct Dispatcher {
    directory: Arc<dyn RecipientDirectory>,
    adapters: Vec<Arc<dyn ChannelAdapter>>,
    links: Arc<dyn LinkBuilder>,
}

impl Dispatcher {
    pub fn new(
        directory: Arc<dyn RecipientDirectory>,
        adapters: Vec<Arc<dyn ChannelAdapter>>,
        links: Arc<dyn LinkBuilder>,
    ) -> Self {
        Self {
            directory,
            adapters,
            links,
        }
    }

    fn adapter_for(&self, channel: Channel) -> Option<&Arc<dyn ChannelAdapter>> {
        self.adapters.iter().find(|a| a.channel() == channel)
    }
}

#[async_trait]
impl BatchDispatch for Dispatcher {
    #[instrument(skip(self, batch), fields(batch_size = batch.len()))]
    async fn dispatch(&self, batch: Vec<BookEvent>) -> usize {
        if batch.is_empty() {
            return 0;
        }

        let message = compose::compose_batch(&batch, self.links.as_ref());

        let recipients = match self.directory.list_recipients().await {
            Ok(recipients) => recipients,
            Err(e) => {
                // All-or-nothing per flush: without a recipient list there
                // is nothing to partially deliver.
                error!(error = %e, "Recipient lookup failed, dropping this batch");
                return 0;
            }
        };

        let mut outcome = DispatchOutcome::default();
        for (recipient, channels) in resolve_recipients(recipients) {
            for channel in channels {
                let Some(adapter) = self.adapter_for(channel) else {
                    debug!(
                        recipient = %recipient.name,
                        channel = channel.name(),
                        "No adapter registered for channel"
                    );
                    continue;
                };

                outcome.attempted += 1;
                if adapter.deliver(&recipient, &message).await {
                    outcome.delivered += 1;
                } else {
                    debug!(
                        recipient = %recipient.name,
                        channel = channel.name(),
                        "Delivery skipped or failed"
                    );
                }
            }
        }

        info!(
            attempted = outcome.attempted,
            delivered = outcome.delivered,
            "Batch dispatched"
        );
        outcome.delivered
    }
}
