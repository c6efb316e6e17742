//! Synthetic cursor generator for RandomSender mode.
//!
//! Each cycle the relay engine upserts one cursor at a uniformly random
//! position under the reserved local-pointer id.  It then flows through the
//! partition router like any other cursor, which makes this mode a handy
//! smoke test for a downstream receiver.

use rand::Rng;
use tuio_core::{CursorEvent, CursorSession, Vec2};

/// Returns a position with both axes in `[0, 1)`.
pub fn random_position<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::new(rng.random::<f32>(), rng.random::<f32>())
}

/// Builds the upsert for this cycle's synthetic cursor.
pub fn random_cursor_event<R: Rng + ?Sized>(rng: &mut R) -> CursorEvent {
    CursorEvent::Updated(CursorSession::local_pointer(random_position(rng)))
}
