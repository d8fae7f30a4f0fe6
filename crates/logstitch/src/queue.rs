//! Bounded batch queue with size- and timer-driven flushing.
//!
//! Events accumulate in an in-memory buffer until either the batch-size
//! threshold is reached or the periodic timer fires; both triggers go
//! through the same [`BatchQueue::flush`] entry point, which is
//! idempotent under concurrent invocation thanks to a non-reentrant
//! guard. The queue is deliberately lossy under pressure: at
//! `max_queue_size` new events are dropped, not blocked.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Error;
use crate::event::Event;

/// Receives drained batches. Implemented by the client facade, which
/// applies the strict/non-strict error policy before the result makes it
/// back here.
#[async_trait]
pub trait FlushHandler: Send + Sync + 'static {
    async fn handle_batch(&self, batch: Vec<Event>) -> Result<(), Error>;
}

/// Bounded in-memory queue of events awaiting delivery.
///
/// Cheap to clone; clones share the same buffer, guard, and timer.
#[derive(Clone)]
pub struct BatchQueue {
    inner: Arc<Inner>,
}

struct Inner {
    events: Mutex<Vec<Event>>,
    flushing: AtomicBool,
    timer: Mutex<Option<CancellationToken>>,
    handler: Arc<dyn FlushHandler>,
    batch_size: usize,
    max_queue_size: usize,
    flush_interval: Duration,
}

/// Clears the flushing flag on every exit path, including a panicking
/// handler.
struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[allow(clippy::expect_used)]
impl BatchQueue {
    pub fn new(
        handler: Arc<dyn FlushHandler>,
        batch_size: usize,
        max_queue_size: usize,
        flush_interval: Duration,
    ) -> Self {
        BatchQueue {
            inner: Arc::new(Inner {
                events: Mutex::new(Vec::new()),
                flushing: AtomicBool::new(false),
                timer: Mutex::new(None),
                handler,
                batch_size: batch_size.max(1),
                max_queue_size,
                flush_interval,
            }),
        }
    }

    /// Appends an event. When the queue is full the event is silently
    /// dropped — the backpressure policy is lossy, not blocking. Assigns
    /// the idempotency key at commit time, starts the periodic timer on
    /// first use, and spawns a detached flush once the batch-size
    /// threshold is reached (the caller does not wait for it).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn enqueue(&self, mut event: Event) {
        let len = {
            let mut events = self.inner.events.lock().expect("lock poisoned");
            if events.len() >= self.inner.max_queue_size {
                warn!(
                    max_queue_size = self.inner.max_queue_size,
                    action = %event.action,
                    "audit queue full, dropping event"
                );
                return;
            }
            event.ensure_idempotency_key();
            events.push(event);
            events.len()
        };

        self.ensure_timer();

        if len >= self.inner.batch_size {
            let queue = self.clone();
            tokio::spawn(async move {
                // The handler already routed any failure through the
                // error policy; nothing left to do but trace it.
                if let Err(err) = queue.flush().await {
                    debug!(error = %err, "size-triggered flush failed");
                }
            });
        }
    }

    /// Drains all currently-queued events and hands them to the handler
    /// as one batch.
    ///
    /// No-op when a flush is already in flight or the queue is empty.
    /// Events enqueued while the handler is running accumulate toward
    /// the next batch rather than joining the in-flight one. Handler
    /// errors propagate to the caller; the guard is released on every
    /// exit path so later flushes can proceed.
    pub async fn flush(&self) -> Result<(), Error> {
        if self.inner.flushing.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let _guard = FlushGuard(&self.inner.flushing);

        let batch = {
            let mut events = self.inner.events.lock().expect("lock poisoned");
            std::mem::take(&mut *events)
        };
        if batch.is_empty() {
            return Ok(());
        }

        debug!(batch_len = batch.len(), "flushing audit batch");
        self.inner.handler.handle_batch(batch).await
    }

    /// Stops the periodic timer, then performs one final flush and waits
    /// for it to settle. Does not abort an in-flight send.
    pub async fn close(&self) -> Result<(), Error> {
        let token = self.inner.timer.lock().expect("lock poisoned").take();
        if let Some(token) = token {
            token.cancel();
        }
        self.flush().await
    }

    /// Number of queued-but-undelivered events.
    pub fn len(&self) -> usize {
        self.inner.events.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_timer(&self) {
        let mut timer = self.inner.timer.lock().expect("lock poisoned");
        if timer.is_some() {
            return;
        }
        let token = CancellationToken::new();
        let cancelled = token.clone();
        *timer = Some(token);

        let queue = self.clone();
        let period = self.inner.flush_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately; consume it so the
            // cadence starts one full interval from now.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(err) = queue.flush().await {
                            debug!(error = %err, "timer-triggered flush failed");
                        }
                    }
                }
            }
        });
    }
}
