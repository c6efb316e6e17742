//! Inbound TUIO listener.
//!
//! Binds a UDP socket on the local TUIO port and runs a dedicated OS thread
//! that decodes every datagram, feeds it to a [`FrameTracker`], and pushes
//! the resulting [`CursorEvent`]s into the operation queue.
//!
//! # Read timeout
//!
//! The socket is configured with a short read timeout.  `recv_from` blocks for
//! at most that long before returning a timeout error; on each wake-up the
//! thread evicts silent sources and checks its stop flag.
//! [`InboundListener::close`] raises the flag and joins the thread, so once it
//! returns the port is free to bind again.
//!
//! # Teardown
//!
//! The thread does not push its final removals through the queue, where a
//! full buffer could drop them.  It hands them back through its join handle
//! and `close` returns them to the caller, together with any removal that was
//! still waiting for queue space when the stop flag was raised.
//!
//! # Decode failures
//!
//! A datagram that is not valid OSC, or carries a profile other than
//! `/tuio/2Dcur`, is dropped with a `debug` log.  The loop keeps running.

use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};
use tuio_core::{decode_frame, CursorEvent, FrameTracker};

use super::BindError;
use crate::application::operation_queue::QueueSender;

/// Upper bound on how long `close` waits for the thread to notice the flag.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Largest datagram accepted.  TUIO bundles stay well below the UDP limit.
const MAX_DATAGRAM: usize = 65_536;

/// A running inbound listener.  Dropping it stops the thread.
#[derive(Debug)]
pub struct InboundListener {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Vec<CursorEvent>>>,
}

impl InboundListener {
    /// Binds `0.0.0.0:port` and starts the listener thread.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Inbound`] if the socket cannot be bound or the
    /// thread cannot be spawned.
    pub fn bind(port: u16, queue: QueueSender) -> Result<Self, BindError> {
        Self::bind_with_tracker(port, queue, FrameTracker::new())
    }

    /// Like [`bind`](Self::bind) with a caller-configured frame tracker.
    pub fn bind_with_tracker(
        port: u16,
        queue: QueueSender,
        tracker: FrameTracker,
    ) -> Result<Self, BindError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let socket = UdpSocket::bind(addr).map_err(|source| BindError::Inbound { addr, source })?;
        socket
            .set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|source| BindError::Inbound { addr, source })?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| BindError::Inbound { addr, source })?;

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("tuio-listener".to_string())
            .spawn(move || listen_loop(socket, queue, tracker, thread_stop))
            .map_err(|source| BindError::Inbound { addr, source })?;

        info!("TUIO listener bound on UDP {local_addr}");
        Ok(Self {
            local_addr,
            stop,
            handle: Some(handle),
        })
    }

    /// The address actually bound (useful when `port` was 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the thread and waits for it to exit, releasing the port.
    ///
    /// Returns the removals the caller must apply to the session table for
    /// the cursors this listener reported.
    pub fn close(mut self) -> Vec<CursorEvent> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Vec<CursorEvent> {
        self.stop.store(true, Ordering::Relaxed);
        let Some(handle) = self.handle.take() else {
            return Vec::new();
        };
        let removals = match handle.join() {
            Ok(removals) => removals,
            Err(_) => {
                error!("TUIO listener thread panicked");
                Vec::new()
            }
        };
        info!("TUIO listener on UDP {} closed", self.local_addr);
        removals
    }
}

impl Drop for InboundListener {
    fn drop(&mut self) {
        let discarded = self.shutdown();
        if !discarded.is_empty() {
            debug!("discarding {} removals from dropped listener", discarded.len());
        }
    }
}

/// The receive loop executed on the listener thread.
///
/// Returns the removals that still have to reach the table.
fn listen_loop(
    socket: UdpSocket,
    queue: QueueSender,
    mut tracker: FrameTracker,
    stop: Arc<AtomicBool>,
) -> Vec<CursorEvent> {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let mut undelivered = Vec::new();

    while !stop.load(Ordering::Relaxed) {
        let received = match socket.recv_from(&mut buf) {
            Ok(pair) => Some(pair),
            Err(e) if is_timeout_error(&e) => None,
            Err(e) => {
                debug!("TUIO recv error: {e}");
                None
            }
        };

        let mut events = tracker.evict_idle(Instant::now());
        if let Some((len, src)) = received {
            match decode_frame(&buf[..len]) {
                Ok(frame) => events.extend(tracker.process(frame, &src.to_string())),
                Err(e) => debug!("dropping datagram from {src}: {e}"),
            }
        }

        if !deliver(&queue, events, &stop, &mut undelivered) {
            // Consumer dropped – gateway is shutting down.
            return Vec::new();
        }
    }

    undelivered.extend(tracker.reset());
    undelivered
}

/// Pushes `events` in order, waiting for queue space.
///
/// If the stop flag interrupts delivery, the removals not yet queued are
/// moved to `undelivered`.  Returns `false` once the consumer is gone.
fn deliver(
    queue: &QueueSender,
    events: Vec<CursorEvent>,
    stop: &AtomicBool,
    undelivered: &mut Vec<CursorEvent>,
) -> bool {
    let mut events = events.into_iter();
    while let Some(event) = events.next() {
        let removal = is_removal(&event).then(|| event.clone());
        if !queue.enqueue_until(event, stop) {
            if queue.is_closed() {
                return false;
            }
            undelivered.extend(removal);
            undelivered.extend(events.filter(is_removal));
            return true;
        }
    }
    true
}

fn is_removal(event: &CursorEvent) -> bool {
    matches!(event, CursorEvent::Removed(_))
}

/// Returns `true` for OS timeout / would-block errors that should be retried.
fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
