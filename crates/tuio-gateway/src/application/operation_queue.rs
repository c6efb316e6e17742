//! Bounded queue of pending session-table mutations.
//!
//! The session table has exactly one writer: the relay engine, once per output
//! cycle.  The inbound listener thread sends [`CursorEvent`]s through this
//! queue instead of touching the table.  The local pointer has its own
//! latest-state slot (see `local_input`).
//!
//! ```text
//!  listener thread ──► [ mpsc, capacity 1024 ] ──► drain_into(table)  (once per cycle)
//! ```
//!
//! Draining is FIFO, so events from one frame are applied in the order the
//! listener derived them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
#[cfg(test)]
use tracing::warn;
use tuio_core::{CursorEvent, SessionTable};

/// Maximum number of operations waiting between two cycles.
pub const OPERATION_QUEUE_CAPACITY: usize = 1024;

/// How long a waiting producer sleeps before re-checking a full queue.
const FULL_QUEUE_BACKOFF: Duration = Duration::from_millis(1);

/// Creates a connected sender/queue pair.
pub fn operation_queue() -> (QueueSender, OperationQueue) {
    operation_queue_with_capacity(OPERATION_QUEUE_CAPACITY)
}

/// Same as [`operation_queue`] with an explicit capacity.
pub fn operation_queue_with_capacity(capacity: usize) -> (QueueSender, OperationQueue) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (QueueSender { tx }, OperationQueue { rx })
}

/// Producer half.  Cheap to clone; one per adapter.
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<CursorEvent>,
}

impl QueueSender {
    /// Enqueues without waiting.  Used by tests to fill the queue.
    ///
    /// Returns `false` if the event was dropped because the queue is full or
    /// the consumer is gone.
    #[cfg(test)]
    pub(crate) fn try_enqueue(&self, event: CursorEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(
                    "operation queue full, dropping event for session {}",
                    event.session_id()
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Enqueues from a plain OS thread, waiting for room while `stop` is clear.
    ///
    /// Returns `false` if the event was dropped because `stop` was raised
    /// while the queue was full, or the consumer is gone.
    ///
    /// Must not be called from inside an async task.
    pub fn enqueue_until(&self, mut event: CursorEvent, stop: &AtomicBool) -> bool {
        loop {
            match self.tx.try_send(event) {
                Ok(()) => return true,
                Err(TrySendError::Closed(_)) => return false,
                Err(TrySendError::Full(returned)) => {
                    if stop.load(Ordering::Relaxed) {
                        return false;
                    }
                    event = returned;
                    std::thread::sleep(FULL_QUEUE_BACKOFF);
                }
            }
        }
    }

    /// Returns `true` once the consuming [`OperationQueue`] has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the relay engine.
#[derive(Debug)]
pub struct OperationQueue {
    rx: mpsc::Receiver<CursorEvent>,
}

impl OperationQueue {
    /// Applies every queued event to `table` in arrival order.
    ///
    /// Returns the number of events applied.  Never waits: events enqueued
    /// after the queue is found empty are left for the next cycle.
    pub fn drain_into(&mut self, table: &mut SessionTable) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    table.apply(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return applied,
            }
        }
    }
}
