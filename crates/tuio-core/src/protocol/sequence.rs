//! Thread-safe frame sequence counter for outbound TUIO bundles.
//!
//! # What is `fseq`? (for beginners)
//!
//! Every TUIO bundle ends with an `fseq` message carrying a frame number.
//! Receivers use it to:
//!
//! - **Discard late datagrams** – UDP may reorder packets; a bundle whose
//!   frame number is older than the last one applied is stale.
//! - **Tell frames apart** – two bundles with identical cursor sets are still
//!   two distinct frames.
//!
//! The gateway advances the counter once per output cycle, even when no cursor
//! survives filtering, so the value is strictly increasing across bundles.
//!
//! # Wire range
//!
//! `fseq` is an OSC `int32`.  The value `-1` is reserved by TUIO to mean
//! "no frame ordering", and non-positive values confuse some receivers, so the
//! counter runs `1, 2, …, i32::MAX` and then wraps back to `1`.

use std::sync::atomic::{AtomicI32, Ordering};

/// A thread-safe, monotonically increasing frame counter.
///
/// # Examples
///
/// ```rust
/// use tuio_core::protocol::FrameSequence;
///
/// let fseq = FrameSequence::new();
/// assert_eq!(fseq.next(), 1);
/// assert_eq!(fseq.next(), 2);
/// ```
#[derive(Debug)]
pub struct FrameSequence {
    /// The value the next call to [`FrameSequence::next`] returns.
    inner: AtomicI32,
}

impl FrameSequence {
    /// Creates a counter whose first value is 1.
    pub fn new() -> Self {
        Self {
            inner: AtomicI32::new(1),
        }
    }

    /// Returns the next frame number and advances the counter.
    ///
    /// Wraps from `i32::MAX` to 1 without panicking.
    pub fn next(&self) -> i32 {
        // `fetch_update` only fails when the closure returns `None`, which this
        // one never does; both arms carry the previous value.
        match self
            .inner
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(if v == i32::MAX { 1 } else { v + 1 })
            }) {
            Ok(prev) | Err(prev) => prev,
        }
    }

    /// Returns the value the next call to [`FrameSequence::next`] will yield.
    pub fn peek(&self) -> i32 {
        self.inner.load(Ordering::Relaxed)
    }
}

impl Default for FrameSequence {
    fn default() -> Self {
        Self::new()
    }
}
