//! RelayEngine: the once-per-cycle heart of the gateway.
//!
//! Every output cycle runs the same fixed sequence:
//!
//! ```text
//! drain queue ──► reconcile local pointer ──► (RandomSending: upsert random -1)
//!             ──► snapshot ──► partition route ──► encode bundle ──► transmit
//!             ──► (mirror)
//! ```
//!
//! The drain and the reconcile are the table's only writers, so the snapshot
//! read right after them is always self-consistent.
//! Everything after the drain only runs when the achieved [`RelayState`]
//! sends.
//!
//! # Architecture
//!
//! The engine depends on the [`BundleTransmitter`] trait only.  The mode
//! controller owns the real UDP sockets and lends them to each cycle through
//! [`CycleOutputs`]; tests pass recording fakes instead.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};
use tuio_core::{CursorEvent, FrameSequence, RelaySettings, RelayState, SessionTable};

use super::local_input::LocalPointerSlot;
use super::operation_queue::OperationQueue;
use super::random_cursor::random_cursor_event;
use super::route_cursors::{build_outbound_frame, encode_osc_mirror};

/// Error type for outbound datagram transmission.
#[derive(Debug, Error)]
pub enum TransmitError {
    /// The OS rejected the send (destination unreachable, buffer full, …).
    #[error("send failed: {0}")]
    Io(#[from] std::io::Error),

    /// The transmitter has no connected socket.
    #[error("outbound socket is not connected")]
    NotConnected,
}

/// Sends one complete datagram to a fixed destination.
///
/// Infrastructure implementations wrap a connected UDP socket; test
/// implementations record calls.
#[async_trait]
pub trait BundleTransmitter: Send + Sync {
    /// Transmits `datagram` as a single UDP payload.
    async fn transmit(&self, datagram: &[u8]) -> Result<(), TransmitError>;
}

/// Transmitters lent to one cycle.
#[derive(Clone, Copy, Default)]
pub struct CycleOutputs<'a> {
    /// The TUIO destination.  `None` when no outbound socket is bound.
    pub tuio: Option<&'a dyn BundleTransmitter>,
    /// The plain-OSC mirror destination, when enabled and bound.
    pub mirror: Option<&'a dyn BundleTransmitter>,
}

/// Result of the most recent TUIO send, shown in the status line.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SendOutcome {
    #[default]
    NotAttempted,
    Sent {
        fseq: i32,
        cursors: usize,
    },
    Failed(String),
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOutcome::NotAttempted => write!(f, "nothing sent yet"),
            SendOutcome::Sent { fseq, cursors } => {
                write!(f, "last frame #{fseq} ({cursors} cursors)")
            }
            SendOutcome::Failed(reason) => write!(f, "last send failed: {reason}"),
        }
    }
}

/// What one call to [`RelayEngine::run_cycle`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Number of queued operations applied to the table.
    pub applied: usize,
    /// `None` when the current state does not send.
    pub sent: Option<SendOutcome>,
}

/// Owns the session table and the outbound frame counter.
#[derive(Debug)]
pub struct RelayEngine {
    table: SessionTable,
    queue: OperationQueue,
    pointer: LocalPointerSlot,
    fseq: FrameSequence,
    last_send: SendOutcome,
}

impl RelayEngine {
    pub fn new(queue: OperationQueue, pointer: LocalPointerSlot) -> Self {
        Self {
            table: SessionTable::new(),
            queue,
            pointer,
            fseq: FrameSequence::new(),
            last_send: SendOutcome::NotAttempted,
        }
    }

    /// Read-only view of the table as of the last drain.
    pub fn table(&self) -> &SessionTable {
        &self.table
    }

    pub fn last_send(&self) -> &SendOutcome {
        &self.last_send
    }

    /// The frame number the next sending cycle will use.
    pub fn next_fseq(&self) -> i32 {
        self.fseq.peek()
    }

    /// Applies queued operations, then the latest local pointer state.
    /// Returns the number of queued operations applied.
    fn sync_table(&mut self) -> usize {
        let applied = self.queue.drain_into(&mut self.table);
        self.pointer.reconcile(&mut self.table);
        applied
    }

    /// Applies everything still queued, then `removals`.
    ///
    /// Used when an inbound listener is torn down: its pending events are
    /// flushed first so its removals are the last word on its cursors.
    pub fn retire(&mut self, removals: Vec<CursorEvent>) {
        self.sync_table();
        for event in removals {
            self.table.apply(event);
        }
    }

    /// Runs one output cycle.
    ///
    /// Send failures are logged and recorded; they never abort the cycle or
    /// affect the next one.
    pub async fn run_cycle(
        &mut self,
        state: RelayState,
        settings: &RelaySettings,
        outputs: CycleOutputs<'_>,
    ) -> CycleReport {
        let applied = self.sync_table();

        if !state.is_sending() {
            return CycleReport {
                applied,
                sent: None,
            };
        }
        let Some(tuio) = outputs.tuio else {
            debug!("state {state:?} sends but no outbound socket is bound");
            return CycleReport {
                applied,
                sent: None,
            };
        };

        if state.generates_random() {
            let event = {
                let mut rng = rand::rng();
                random_cursor_event(&mut rng)
            };
            self.table.apply(event);
            self.pointer.mark_owned();
        }

        let snapshot = self.table.snapshot();
        let fseq = self.fseq.next();

        let frame = match build_outbound_frame(&snapshot, &settings.partition, fseq) {
            Ok(frame) => frame,
            Err(e) => {
                error!("failed to encode frame #{fseq}: {e}");
                let outcome = SendOutcome::Failed(e.to_string());
                self.last_send = outcome.clone();
                return CycleReport {
                    applied,
                    sent: Some(outcome),
                };
            }
        };

        let outcome = match tuio.transmit(&frame.datagram).await {
            Ok(()) => SendOutcome::Sent {
                fseq,
                cursors: frame.cursors.len(),
            },
            Err(e) => {
                warn!("failed to send frame #{fseq}: {e}");
                SendOutcome::Failed(e.to_string())
            }
        };

        if let (Some(mirror), Some(mirror_settings)) = (outputs.mirror, &settings.osc_mirror) {
            match encode_osc_mirror(&frame.cursors, mirror_settings.max_cursor_count) {
                Ok(datagrams) => {
                    for datagram in &datagrams {
                        if let Err(e) = mirror.transmit(datagram).await {
                            debug!("OSC mirror send failed: {e}");
                        }
                    }
                }
                Err(e) => error!("failed to encode OSC mirror: {e}"),
            }
        }

        self.last_send = outcome.clone();
        CycleReport {
            applied,
            sent: Some(outcome),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
