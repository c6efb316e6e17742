//! Turns inbound TUIO frames into typed cursor events.
//!
//! TUIO never says "cursor 5 was added".  It says "these ids are alive" and
//! "cursor 5 is at (x, y)".  The tracker remembers which ids each source had
//! last frame and derives the difference:
//!
//! ```text
//! last frame alive {1, 2}      this frame alive {2, 3}, set 2, set 3
//!   → Removed(1)  Updated(2)  Added(3)
//! ```
//!
//! # Late frames
//!
//! UDP may reorder datagrams.  A frame whose `fseq` is not newer than the last
//! applied frame of the same source is dropped, except when:
//!
//! - `fseq == -1` – TUIO's "no ordering" marker;
//! - the gap exceeds [`FRAME_RESTART_WINDOW`] – the sender most likely
//!   restarted its counter.
//!
//! # Silent sources
//!
//! A sender that crashes never sends its final empty `alive`.  Sources that
//! stay silent for longer than the idle timeout are evicted by
//! [`FrameTracker::evict_idle`], which reports their cursors as removed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::cursor::{CursorEvent, CursorSession, SessionId};
use crate::protocol::tuio::TuioFrame;

/// An older frame number this far behind the last one is a sender restart.
pub const FRAME_RESTART_WINDOW: i64 = 100;

/// How long a source may stay silent before its cursors are dropped.
pub const SOURCE_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-source tracking state.
#[derive(Debug)]
struct SourceState {
    last_fseq: Option<i32>,
    last_seen: Instant,
    live: HashMap<SessionId, CursorSession>,
}

impl SourceState {
    fn new(now: Instant) -> Self {
        Self {
            last_fseq: None,
            last_seen: now,
            live: HashMap::new(),
        }
    }

    fn accepts(&self, fseq: Option<i32>) -> bool {
        match (fseq, self.last_fseq) {
            (None, _) | (Some(-1), _) | (_, None) => true,
            (Some(frame), Some(last)) => {
                let (frame, last) = (i64::from(frame), i64::from(last));
                frame > last || last - frame > FRAME_RESTART_WINDOW
            }
        }
    }
}

/// Inbound frame tracker, keyed by source name.
#[derive(Debug)]
pub struct FrameTracker {
    sources: HashMap<String, SourceState>,
    idle_timeout: Duration,
}

impl Default for FrameTracker {
    fn default() -> Self {
        Self::with_idle_timeout(SOURCE_IDLE_TIMEOUT)
    }
}

impl FrameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sources: HashMap::new(),
            idle_timeout,
        }
    }

    /// Processes one frame and returns the events it implies.
    ///
    /// `fallback_source` names the sender when the frame has no `source`
    /// message; the listener passes the datagram's source address.
    ///
    /// Returns an empty list for late frames.
    pub fn process(&mut self, frame: TuioFrame, fallback_source: &str) -> Vec<CursorEvent> {
        self.process_at(frame, fallback_source, Instant::now())
    }

    /// [`process`](Self::process) with an explicit arrival time.
    pub fn process_at(
        &mut self,
        frame: TuioFrame,
        fallback_source: &str,
        now: Instant,
    ) -> Vec<CursorEvent> {
        let source = frame
            .source
            .clone()
            .unwrap_or_else(|| fallback_source.to_string());
        let state = self
            .sources
            .entry(source.clone())
            .or_insert_with(|| SourceState::new(now));
        // Late frames still prove the source is alive.
        state.last_seen = now;

        if !state.accepts(frame.fseq) {
            debug!(
                "dropping late frame {:?} from {source} (last {:?})",
                frame.fseq, state.last_fseq
            );
            return Vec::new();
        }
        if let Some(f) = frame.fseq.filter(|&f| f != -1) {
            state.last_fseq = Some(f);
        }

        let mut events = Vec::new();

        if let Some(alive) = &frame.alive {
            let gone: Vec<SessionId> = state
                .live
                .keys()
                .copied()
                .filter(|id| !alive.contains(id))
                .collect();
            for id in gone {
                if let Some(session) = state.live.remove(&id) {
                    events.push(CursorEvent::Removed(session));
                }
            }
        }

        for set in &frame.sets {
            let listed = frame
                .alive
                .as_ref()
                .map_or(true, |alive| alive.contains(&set.session_id));
            if !listed {
                debug!(
                    "ignoring set for id {} not in alive list from {source}",
                    set.session_id
                );
                continue;
            }
            let session = set.into_session(&source);
            let event = if state.live.contains_key(&set.session_id) {
                CursorEvent::Updated(session.clone())
            } else {
                CursorEvent::Added(session.clone())
            };
            state.live.insert(set.session_id, session);
            events.push(event);
        }

        events
    }

    /// Drops every source silent since before `now - idle_timeout` and
    /// returns `Removed` for the cursors it still had.
    pub fn evict_idle(&mut self, now: Instant) -> Vec<CursorEvent> {
        let timeout = self.idle_timeout;
        let idle: Vec<String> = self
            .sources
            .iter()
            .filter(|(_, state)| now.saturating_duration_since(state.last_seen) > timeout)
            .map(|(name, _)| name.clone())
            .collect();

        let mut events = Vec::new();
        for name in idle {
            if let Some(state) = self.sources.remove(&name) {
                if !state.live.is_empty() {
                    debug!("source {name} went silent, dropping {} cursors", state.live.len());
                }
                events.extend(state.live.into_values().map(CursorEvent::Removed));
            }
        }
        events
    }

    /// Forgets every source, emitting `Removed` for all cursors still live.
    ///
    /// Called when the inbound listener is torn down so its cursors do not
    /// linger in the session table.
    pub fn reset(&mut self) -> Vec<CursorEvent> {
        self.sources
            .drain()
            .flat_map(|(_, state)| state.live.into_values())
            .map(CursorEvent::Removed)
            .collect()
    }

    /// Number of cursors currently live across all sources.
    pub fn live_count(&self) -> usize {
        self.sources.values().map(|s| s.live.len()).sum()
    }
}
