//! Local pointer adapter: turns pointer down/drag/up into the state of the
//! reserved session `-1`.
//!
//! Unlike network cursors, the local pointer does not travel through the
//! operation queue.  The adapter publishes only its *latest* state (pressed at
//! a position, or released) on a `tokio::sync::watch` channel, and the relay
//! engine reconciles the table against it once per cycle:
//!
//! ```text
//!  pointer_down/drag/up ──► watch<Option<Vec2>> ──► LocalPointerSlot::reconcile(table)
//! ```
//!
//! A full queue therefore can never lose a pointer-up, and an up after a drag
//! in the same cycle leaves the table without the local pointer.

use tokio::sync::watch;
use tuio_core::{CursorSession, SessionTable, Vec2, LOCAL_POINTER_SESSION};

/// `Some(position)` while pressed, `None` while released.
type PointerState = Option<Vec2>;

/// Creates a connected adapter/slot pair.
pub fn local_pointer() -> (LocalInputAdapter, LocalPointerSlot) {
    let (tx, rx) = watch::channel(None);
    (
        LocalInputAdapter { state: tx },
        LocalPointerSlot {
            state: rx,
            owns_entry: false,
        },
    )
}

/// Converts raw pointer coordinates into normalized local-pointer state.
#[derive(Debug)]
pub struct LocalInputAdapter {
    state: watch::Sender<PointerState>,
}

impl LocalInputAdapter {
    /// Whether the pointer is currently held down.
    pub fn is_pressed(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Pointer pressed at `(x, y)` on a `width` × `height` surface.
    pub fn pointer_down(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.state.send_replace(Some(normalize(x, y, width, height)));
    }

    /// Pointer moved while held.  Ignored when the pointer is up, so a stray
    /// drag after an up does not resurrect the pointer.
    pub fn pointer_drag(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if !self.is_pressed() {
            return;
        }
        self.state.send_replace(Some(normalize(x, y, width, height)));
    }

    /// Pointer released.
    pub fn pointer_up(&mut self) {
        self.state.send_replace(None);
    }
}

/// Engine side of the local pointer.
#[derive(Debug)]
pub struct LocalPointerSlot {
    state: watch::Receiver<PointerState>,
    /// Whether the `-1` entry in the table was put there by this gateway
    /// (local pointer or random cursor) rather than relayed from upstream.
    owns_entry: bool,
}

impl LocalPointerSlot {
    /// The latest published pointer state.
    pub fn current(&self) -> Option<Vec2> {
        *self.state.borrow()
    }

    /// Brings the table's `-1` entry in line with the latest pointer state.
    ///
    /// While pressed the entry is upserted.  Once released, an entry this
    /// gateway owns is removed; a `-1` relayed from upstream is left alone.
    pub fn reconcile(&mut self, table: &mut SessionTable) {
        match self.current() {
            Some(position) => {
                table.upsert(CursorSession::local_pointer(position));
                self.owns_entry = true;
            }
            None if self.owns_entry => {
                table.remove(LOCAL_POINTER_SESSION);
                self.owns_entry = false;
            }
            None => {}
        }
    }

    /// Records that the engine wrote a synthetic cursor under `-1` itself.
    pub fn mark_owned(&mut self) {
        self.owns_entry = true;
    }
}

/// Maps raw coordinates into `[0, 1]²`.  A zero-sized surface maps to the origin.
fn normalize(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    if !(width > 0.0 && height > 0.0) {
        return Vec2::ZERO;
    }
    Vec2::new(clamp_unit(x / width), clamp_unit(y / height))
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::operation_queue::operation_queue_with_capacity;
    use tuio_core::CursorEvent;

    #[test]
    fn test_pointer_down_inserts_normalized_local_pointer() {
        // Arrange
        let (mut input, mut slot) = local_pointer();
        let mut table = SessionTable::new();

        // Act
        input.pointer_down(480.0, 270.0, 1920.0, 1080.0);
        slot.reconcile(&mut table);

        // Assert
        let p = table.get(LOCAL_POINTER_SESSION).expect("pointer must be present");
        assert!((p.position.x - 0.25).abs() < 1e-6);
        assert!((p.position.y - 0.25).abs() < 1e-6);
        assert_eq!(p.velocity, Vec2::ZERO);
        assert_eq!(p.acceleration, 0.0);
    }

    #[test]
    fn test_up_after_drag_in_same_cycle_leaves_no_pointer() {
        // Arrange
        let (mut input, mut slot) = local_pointer();
        let mut table = SessionTable::new();

        // Act
        input.pointer_down(10.0, 10.0, 100.0, 100.0);
        input.pointer_drag(20.0, 20.0, 100.0, 100.0);
        input.pointer_up();
        slot.reconcile(&mut table);

        // Assert
        assert!(!table.contains(LOCAL_POINTER_SESSION));
    }

    #[test]
    fn test_release_removes_pointer_on_next_reconcile() {
        // Arrange
        let (mut input, mut slot) = local_pointer();
        let mut table = SessionTable::new();
        input.pointer_down(10.0, 10.0, 100.0, 100.0);
        slot.reconcile(&mut table);

        // Act
        input.pointer_up();
        slot.reconcile(&mut table);

        // Assert
        assert!(table.is_empty());
    }

    #[test]
    fn test_release_is_not_lost_when_operation_queue_is_full() {
        // Arrange – a tiny queue saturated by network traffic
        let (tx, mut queue) = operation_queue_with_capacity(2);
        let (mut input, mut slot) = local_pointer();
        let mut table = SessionTable::new();
        input.pointer_down(50.0, 50.0, 100.0, 100.0);
        slot.reconcile(&mut table);
        tx.try_enqueue(CursorEvent::Updated(CursorSession::at(5, Vec2::new(0.5, 0.5))));
        tx.try_enqueue(CursorEvent::Updated(CursorSession::at(6, Vec2::new(0.6, 0.5))));
        assert!(!tx.try_enqueue(CursorEvent::Updated(CursorSession::at(7, Vec2::ZERO))));

        // Act
        input.pointer_up();
        queue.drain_into(&mut table);
        slot.reconcile(&mut table);

        // Assert
        assert!(!input.is_pressed());
        assert!(!table.contains(LOCAL_POINTER_SESSION));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_relayed_reserved_id_survives_while_released() {
        // Arrange – an upstream gateway forwarded its own local pointer
        let (_input, mut slot) = local_pointer();
        let mut table = SessionTable::new();
        table.upsert(CursorSession::local_pointer(Vec2::new(0.3, 0.3)));

        // Act
        slot.reconcile(&mut table);

        // Assert
        assert!(table.contains(LOCAL_POINTER_SESSION));
    }

    #[test]
    fn test_owned_synthetic_cursor_is_removed_once_released() {
        let (_input, mut slot) = local_pointer();
        let mut table = SessionTable::new();
        table.upsert(CursorSession::local_pointer(Vec2::new(0.9, 0.1)));
        slot.mark_owned();

        slot.reconcile(&mut table);

        assert!(table.is_empty());
    }

    #[test]
    fn test_drag_without_press_is_ignored() {
        let (mut input, slot) = local_pointer();

        input.pointer_drag(50.0, 50.0, 100.0, 100.0);

        assert_eq!(slot.current(), None);
    }

    #[test]
    fn test_drag_after_up_is_ignored() {
        // Arrange
        let (mut input, mut slot) = local_pointer();
        let mut table = SessionTable::new();
        input.pointer_down(10.0, 10.0, 100.0, 100.0);
        input.pointer_up();

        // Act
        input.pointer_drag(90.0, 90.0, 100.0, 100.0);
        slot.reconcile(&mut table);

        // Assert
        assert!(table.is_empty());
        assert!(!input.is_pressed());
    }

    #[test]
    fn test_positions_outside_surface_are_clamped() {
        let (mut input, slot) = local_pointer();

        input.pointer_down(-40.0, 500.0, 100.0, 100.0);

        assert_eq!(slot.current(), Some(Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn test_zero_sized_surface_maps_to_origin() {
        assert_eq!(normalize(5.0, 5.0, 0.0, 100.0), Vec2::ZERO);
        assert_eq!(normalize(5.0, 5.0, 100.0, 0.0), Vec2::ZERO);
    }

    #[test]
    fn test_drag_moves_existing_pointer() {
        // Arrange
        let (mut input, mut slot) = local_pointer();
        let mut table = SessionTable::new();
        input.pointer_down(10.0, 10.0, 100.0, 100.0);
        slot.reconcile(&mut table);

        // Act
        input.pointer_drag(70.0, 30.0, 100.0, 100.0);
        slot.reconcile(&mut table);

        // Assert
        assert_eq!(table.len(), 1);
        let p = table.get(LOCAL_POINTER_SESSION).expect("pointer must be present");
        assert!((p.position.x - 0.7).abs() < 1e-6);
    }
}
