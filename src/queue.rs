//! The debounced batching queue.
//!
//! Producers call [`BatchQueue::enqueue`] from any task; events accumulate in
//! a pending list guarded by a mutex. Every arrival re-arms a single one-shot
//! timer, so the flush fires exactly one quiet period after the *last* event.
//! The flush swaps the pending list out under the lock and hands it to the
//! dispatcher outside the lock, so delivery I/O never blocks producers.

use crate::core::BookEvent;
use crate::dispatch::BatchDispatch;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Process-wide buffer of pending events with a debounce timer.
///
/// Cloning is cheap and shares the same queue. Must be used inside a tokio
/// runtime; the timer is a spawned task that does not block process exit.
#[derive(Clone)]
pub struct BatchQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    state: Mutex<QueueState>,
    quiet_period: Duration,
    dispatcher: Arc<dyn BatchDispatch>,
}

/// The pending list and timer handle are only ever mutated together, under
/// the one lock wrapping this struct.
#[derive(Default)]
struct QueueState {
    pending: Vec<BookEvent>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every enqueue. A timer task whose epoch no longer matches
    /// lost a race with `abort` and must not flush.
    epoch: u64,
}

impl BatchQueue {
    /// Creates a queue that hands each flushed batch to `dispatcher`.
    pub fn new(quiet_period: Duration, dispatcher: Arc<dyn BatchDispatch>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::default()),
                quiet_period,
                dispatcher,
            }),
        }
    }

    /// Producer-facing fire-and-forget entry point: queue a new-book event
    /// for batched delivery.
    pub fn enqueue_new_book(
        &self,
        title: impl Into<String>,
        authors: Vec<String>,
        book_id: Option<i64>,
    ) {
        self.enqueue(BookEvent::new(title, authors, book_id));
    }

    /// Appends `event` and re-arms the debounce timer. Returns immediately;
    /// safe to call concurrently from arbitrarily many producer tasks.
    pub fn enqueue(&self, event: BookEvent) {
        let mut state = self.inner.state.lock().unwrap();
        state.pending.push(event);

        // Append, cancel-old-timer, and start-new-timer form one critical
        // section so the flush always fires quiet_period after the last
        // arrival. The deadline is anchored here, not at the spawned
        // task's first poll.
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.epoch += 1;
        let epoch = state.epoch;
        let deadline = tokio::time::Instant::now() + self.inner.quiet_period;

        debug!(
            pending = state.pending.len(),
            quiet_period_secs = self.inner.quiet_period.as_secs(),
            "Event queued, debounce timer re-armed"
        );

        let inner = Arc::clone(&self.inner);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            Self::flush(inner, epoch).await;
        }));
    }

    /// Number of events currently waiting for the timer to fire.
    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().unwrap().pending.len()
    }

    /// Waits for the armed debounce timer, if any, to fire and for the
    /// flush it triggers to finish dispatching. Intended for shutdown
    /// paths once producers have stopped; there is no way to flush early.
    pub async fn settle(&self) {
        let timer = self.inner.state.lock().unwrap().timer.take();
        if let Some(timer) = timer {
            // The timer task only completes after the dispatch it started
            // has returned.
            let _ = timer.await;
        }
    }

    /// Timer-invoked: swap out the pending batch and dispatch it.
    async fn flush(inner: Arc<QueueInner>, epoch: u64) {
        let batch = {
            let mut state = inner.state.lock().unwrap();
            if state.epoch != epoch {
                // A newer arrival re-armed the timer after our sleep
                // completed; that timer owns the batch now.
                return;
            }
            state.timer = None;
            std::mem::take(&mut state.pending)
        };

        if batch.is_empty() {
            return;
        }

        info!(batch_size = batch.len(), "Quiet period elapsed, flushing batch");
        let delivered = inner.dispatcher.dispatch(batch).await;
        debug!(delivered, "Batch dispatch finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::time::{advance, pause, sleep};

    const QUIET: Duration = Duration::from_secs(300);

    /// Records every dispatched batch, optionally simulating slow delivery.
    struct FakeDispatcher {
        batches: Mutex<Vec<Vec<BookEvent>>>,
        delay: Duration,
    }

    impl FakeDispatcher {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                delay,
            }
        }

        fn batches(&self) -> Vec<Vec<BookEvent>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BatchDispatch for FakeDispatcher {
        async fn dispatch(&self, batch: Vec<BookEvent>) -> usize {
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            let size = batch.len();
            self.batches.lock().unwrap().push(batch);
            size
        }
    }

    fn event(title: &str) -> BookEvent {
        BookEvent::new(title, vec!["Author".to_string()], None)
    }

    #[tokio::test]
    async fn single_event_flushes_once_after_quiet_period() {
        pause();
        let dispatcher = Arc::new(FakeDispatcher::new());
        let queue = BatchQueue::new(QUIET, dispatcher.clone());

        queue.enqueue(event("Dune"));
        assert_eq!(queue.pending_len(), 1);

        advance(QUIET + Duration::from_secs(1)).await;
        sleep(Duration::from_millis(10)).await;

        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].title, "Dune");
        assert_eq!(queue.pending_len(), 0);

        // Silence afterwards must not produce a second flush.
        advance(QUIET * 3).await;
        sleep(Duration::from_millis(10)).await;
        assert_eq!(dispatcher.batches().len(), 1);
    }

    #[tokio::test]
    async fn rapid_fire_enqueues_coalesce_into_one_flush() {
        pause();
        let dispatcher = Arc::new(FakeDispatcher::new());
        let queue = BatchQueue::new(QUIET, dispatcher.clone());

        for i in 0..5 {
            queue.enqueue(event(&format!("Book {}", i)));
            advance(Duration::from_secs(10)).await;
        }

        // The last enqueue re-armed the timer; nothing has flushed yet.
        assert_eq!(dispatcher.batches().len(), 0);
        assert_eq!(queue.pending_len(), 5);

        advance(QUIET).await;
        sleep(Duration::from_millis(10)).await;

        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 1);
        let titles: Vec<&str> = batches[0].iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Book 0", "Book 1", "Book 2", "Book 3", "Book 4"]);
    }

    #[tokio::test]
    async fn isolated_groups_flush_separately() {
        pause();
        let dispatcher = Arc::new(FakeDispatcher::new());
        let queue = BatchQueue::new(Duration::from_secs(5), dispatcher.clone());

        queue.enqueue(event("Book A"));
        advance(Duration::from_secs(1)).await;
        queue.enqueue(event("Book B"));

        advance(Duration::from_secs(6)).await;
        sleep(Duration::from_millis(10)).await;

        queue.enqueue(event("Book C"));
        advance(Duration::from_secs(6)).await;
        sleep(Duration::from_millis(10)).await;

        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 1);
        assert_eq!(batches[1][0].title, "Book C");
    }

    #[tokio::test]
    async fn enqueue_during_in_flight_flush_starts_a_fresh_batch() {
        pause();
        let dispatcher = Arc::new(FakeDispatcher::slow(Duration::from_secs(30)));
        let queue = BatchQueue::new(QUIET, dispatcher.clone());

        queue.enqueue(event("Book A"));
        advance(QUIET + Duration::from_secs(1)).await;
        sleep(Duration::from_millis(10)).await;

        // The first flush is now sleeping inside the dispatcher; this event
        // must land in a new batch with its own timer.
        queue.enqueue(event("Book B"));
        assert_eq!(queue.pending_len(), 1);

        // Fire Book B's timer first, then ride out its slow dispatch,
        // whose sleep only starts once the flush has entered the
        // dispatcher.
        advance(QUIET + Duration::from_secs(1)).await;
        sleep(Duration::from_millis(10)).await;
        advance(Duration::from_secs(31)).await;
        sleep(Duration::from_millis(10)).await;

        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0][0].title, "Book A");
        assert_eq!(batches[1][0].title, "Book B");
    }

    #[tokio::test]
    async fn concurrent_producers_lose_no_events() {
        pause();
        let dispatcher = Arc::new(FakeDispatcher::new());
        let queue = BatchQueue::new(QUIET, dispatcher.clone());

        let producers = 300;
        let mut handles = Vec::with_capacity(producers);
        for i in 0..producers {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                queue.enqueue(event(&format!("Book {}", i)));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(queue.pending_len(), producers);
        assert_eq!(dispatcher.batches().len(), 0);

        advance(QUIET + Duration::from_secs(1)).await;
        sleep(Duration::from_millis(10)).await;

        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), producers);
    }

    #[tokio::test]
    async fn settle_waits_out_the_timer_and_its_dispatch() {
        pause();
        let dispatcher = Arc::new(FakeDispatcher::slow(Duration::from_secs(30)));
        let queue = BatchQueue::new(QUIET, dispatcher.clone());

        queue.enqueue(event("Dune"));
        // No explicit advance: paused time auto-advances while settle is
        // the only task, carrying it through the quiet period and the
        // slow dispatch.
        queue.settle().await;

        assert_eq!(dispatcher.batches().len(), 1);
        assert_eq!(queue.pending_len(), 0);
    }

    #[tokio::test]
    async fn settle_returns_immediately_when_idle() {
        pause();
        let dispatcher = Arc::new(FakeDispatcher::new());
        let queue = BatchQueue::new(QUIET, dispatcher.clone());

        queue.settle().await;
        assert_eq!(dispatcher.batches().len(), 0);
    }

    #[tokio::test]
    async fn scenario_two_books_one_flush() {
        pause();
        let dispatcher = Arc::new(FakeDispatcher::new());
        let queue = BatchQueue::new(Duration::from_secs(5), dispatcher.clone());

        queue.enqueue_new_book("Book A", vec!["Alice".to_string()], Some(1));
        advance(Duration::from_secs(1)).await;
        queue.enqueue_new_book("Book B", vec!["Bob".to_string()], Some(2));

        advance(Duration::from_secs(5)).await;
        sleep(Duration::from_millis(10)).await;

        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 1);
        let titles: Vec<&str> = batches[0].iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Book A", "Book B"]);
    }
}
