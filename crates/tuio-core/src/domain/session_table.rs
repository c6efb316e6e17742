//! The session table: every cursor the gateway currently considers live.
//!
//! The table is a plain map from [`SessionId`] to [`CursorSession`].  It does
//! no I/O and no locking; the relay engine owns it exclusively and feeds it
//! [`CursorEvent`]s drained from the operation queue, so readers always see a
//! table that is not being modified underneath them.
//!
//! # Tolerated protocol violations
//!
//! - `Added` for an id that already exists overwrites the entry.
//! - `Updated` for an unknown id inserts it.
//! - `Removed` for an unknown id does nothing.
//!
//! None of these fail the stream.

use std::collections::HashMap;

use tracing::debug;

use super::cursor::{CursorEvent, CursorSession, SessionId};

/// In-memory map of live cursor sessions.
///
/// # HashMap choice
///
/// Iteration order is unspecified.  Outbound `set` messages follow that order;
/// TUIO receivers do not depend on `set` ordering across sessions.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SessionTable {
    sessions: HashMap<SessionId, CursorSession>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one mutation event.
    pub fn apply(&mut self, event: CursorEvent) {
        match event {
            CursorEvent::Added(session) => {
                let id = session.session_id;
                if self.sessions.insert(id, session).is_some() {
                    debug!("session {id} added twice; overwriting");
                }
            }
            CursorEvent::Updated(session) => self.upsert(session),
            CursorEvent::Removed(session) => {
                self.remove(session.session_id);
            }
        }
    }

    /// Inserts or overwrites a session.
    pub fn upsert(&mut self, session: CursorSession) {
        self.sessions.insert(session.session_id, session);
    }

    /// Removes a session.  Returns the removed entry, if any.
    pub fn remove(&mut self, id: SessionId) -> Option<CursorSession> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: SessionId) -> Option<&CursorSession> {
        self.sessions.get(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterates over the live sessions in table order.
    pub fn iter(&self) -> impl Iterator<Item = &CursorSession> {
        self.sessions.values()
    }

    /// Returns a point-in-time copy of every live session.
    pub fn snapshot(&self) -> Vec<CursorSession> {
        self.sessions.values().cloned().collect()
    }

    /// Removes every session.
    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cursor::{Vec2, LOCAL_POINTER_SESSION};

    fn cursor(id: SessionId, x: f32, y: f32) -> CursorSession {
        CursorSession::at(id, Vec2::new(x, y))
    }

    #[test]
    fn test_table_starts_empty() {
        let table = SessionTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_added_inserts_session() {
        // Arrange
        let mut table = SessionTable::new();

        // Act
        table.apply(CursorEvent::Added(cursor(1, 0.1, 0.2)));

        // Assert
        assert_eq!(table.get(1), Some(&cursor(1, 0.1, 0.2)));
    }

    #[test]
    fn test_duplicate_add_overwrites_without_duplicating() {
        // Arrange
        let mut table = SessionTable::new();
        table.apply(CursorEvent::Added(cursor(1, 0.1, 0.2)));

        // Act
        table.apply(CursorEvent::Added(cursor(1, 0.5, 0.6)));

        // Assert
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(1).unwrap().position, Vec2::new(0.5, 0.6));
    }

    #[test]
    fn test_update_for_unknown_id_inserts() {
        let mut table = SessionTable::new();
        table.apply(CursorEvent::Updated(cursor(9, 0.3, 0.3)));
        assert!(table.contains(9));
    }

    #[test]
    fn test_update_is_idempotent() {
        // Arrange
        let mut once = SessionTable::new();
        let mut twice = SessionTable::new();
        let update = CursorEvent::Updated(cursor(3, 0.4, 0.7));

        // Act
        once.apply(update.clone());
        twice.apply(update.clone());
        twice.apply(update);

        // Assert
        assert_eq!(once, twice);
    }

    #[test]
    fn test_remove_deletes_and_absent_remove_is_noop() {
        // Arrange
        let mut table = SessionTable::new();
        table.apply(CursorEvent::Added(cursor(1, 0.1, 0.1)));

        // Act
        table.apply(CursorEvent::Removed(cursor(1, 0.0, 0.0)));
        table.apply(CursorEvent::Removed(cursor(77, 0.0, 0.0)));

        // Assert
        assert!(table.is_empty());
    }

    #[test]
    fn test_at_most_one_entry_per_id_over_mixed_sequence() {
        // Arrange
        let mut table = SessionTable::new();
        let events = [
            CursorEvent::Added(cursor(1, 0.1, 0.1)),
            CursorEvent::Updated(cursor(1, 0.2, 0.2)),
            CursorEvent::Added(cursor(2, 0.3, 0.3)),
            CursorEvent::Added(cursor(1, 0.4, 0.4)),
            CursorEvent::Updated(cursor(2, 0.5, 0.5)),
            CursorEvent::Updated(cursor(LOCAL_POINTER_SESSION, 0.6, 0.6)),
        ];

        for event in events {
            // Act
            table.apply(event);

            // Assert – ids in the snapshot are unique after every step
            let mut ids: Vec<SessionId> = table.iter().map(|c| c.session_id).collect();
            let before = ids.len();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), before);
        }
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_mutation() {
        // Arrange
        let mut table = SessionTable::new();
        table.upsert(cursor(1, 0.1, 0.1));

        // Act
        let snapshot = table.snapshot();
        table.clear();

        // Assert
        assert_eq!(snapshot.len(), 1);
        assert!(table.is_empty());
    }
}
