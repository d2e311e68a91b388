//! Mutation batching.
//!
//! Mutations emitted in one burst are collected and sent as a single
//! `mutation-batch` message. The first push into an empty queue schedules a
//! flush for the scheduler's next turn; the flush swaps the whole queue out
//! and hands it to the transport in emission order.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};
use wsdom_protocols::{Mutation, Transport, WireMessage};

/// Result of one flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was queued.
    Empty,
    /// The batch of this many mutations was handed to the transport.
    Sent(usize),
    /// No open transport; the batch was discarded.
    Dropped(usize),
    /// The transport rejected the batch.
    Failed(usize),
}

/// Runs a deferred flush.
pub trait FlushScheduler: Send + Sync {
    fn schedule(&self, flush: Box<dyn FnOnce() + Send>);
}

/// Defers flushes to a later turn of the current tokio runtime. Outside a
/// runtime the flush runs inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl FlushScheduler for TokioScheduler {
    fn schedule(&self, flush: Box<dyn FnOnce() + Send>) {
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::task::yield_now().await;
                    flush();
                });
            }
            Err(_) => flush(),
        }
    }
}

/// Per-session mutation queue.
pub struct MutationBatcher {
    queue: Mutex<Vec<Mutation>>,
    transport: Mutex<Option<Arc<dyn Transport>>>,
    scheduler: Box<dyn FlushScheduler>,
}

impl MutationBatcher {
    pub fn new() -> Self {
        Self::with_scheduler(TokioScheduler)
    }

    pub fn with_scheduler(scheduler: impl FlushScheduler + 'static) -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            transport: Mutex::new(None),
            scheduler: Box::new(scheduler),
        }
    }

    /// Route future flushes to `transport`.
    pub fn attach(&self, transport: Arc<dyn Transport>) {
        *self.transport.lock() = Some(transport);
    }

    /// Stop delivering. Later flushes drop their batch.
    pub fn detach(&self) {
        *self.transport.lock() = None;
    }

    pub fn is_attached(&self) -> bool {
        self.transport.lock().is_some()
    }

    /// Number of mutations waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Queue `mutation`, scheduling a flush if the queue was empty.
    pub fn push(self: &Arc<Self>, mutation: Mutation) {
        self.extend(std::iter::once(mutation));
    }

    /// Queue a whole burst at once. A flush never splits it.
    pub fn extend(self: &Arc<Self>, mutations: impl IntoIterator<Item = Mutation>) {
        let first = {
            let mut queue = self.queue.lock();
            let was_empty = queue.is_empty();
            queue.extend(mutations);
            was_empty && !queue.is_empty()
        };
        if first {
            trace!("Scheduling mutation flush");
            let batcher = Arc::clone(self);
            self.scheduler.schedule(Box::new(move || {
                batcher.flush();
            }));
        }
    }

    /// Send everything queued as one batch.
    pub fn flush(&self) -> FlushOutcome {
        let mutations = std::mem::take(&mut *self.queue.lock());
        if mutations.is_empty() {
            return FlushOutcome::Empty;
        }
        let count = mutations.len();

        let transport = self.transport.lock().clone();
        let Some(transport) = transport.filter(|t| t.is_open()) else {
            debug!("Transport closed, dropping {} mutations", count);
            return FlushOutcome::Dropped(count);
        };

        match transport.send(&WireMessage::batch(mutations)) {
            Ok(()) => {
                trace!("Flushed {} mutations", count);
                FlushOutcome::Sent(count)
            }
            Err(e) => {
                warn!("Failed to send mutation batch: {}", e);
                FlushOutcome::Failed(count)
            }
        }
    }
}

impl Default for MutationBatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MutationBatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationBatcher")
            .field("pending", &self.pending())
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
