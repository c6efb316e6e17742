//! Cursor session entity and the typed events that mutate the session table.

/// Protocol-assigned identifier of one touch/pointer identity.
pub type SessionId = i32;

/// Reserved session id for the single synthetic local-pointer cursor.
///
/// Protocol-assigned ids are non-negative, so this never collides with a
/// session received from the network.
pub const LOCAL_POINTER_SESSION: SessionId = -1;

/// A 2-D vector in normalized surface units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One active touch/pointer identity.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorSession {
    /// Unique key within the session table.
    pub session_id: SessionId,
    /// Origin tag reported by the protocol sender.  Empty for local cursors.
    pub source: String,
    /// Normalized surface position, each axis in `[0, 1]`.
    pub position: Vec2,
    /// Normalized units per time unit.
    pub velocity: Vec2,
    pub acceleration: f32,
}

impl CursorSession {
    /// Creates a motionless cursor at `position`.
    pub fn at(session_id: SessionId, position: Vec2) -> Self {
        Self {
            session_id,
            source: String::new(),
            position,
            velocity: Vec2::ZERO,
            acceleration: 0.0,
        }
    }

    /// Creates the reserved local-pointer cursor at `position`.
    pub fn local_pointer(position: Vec2) -> Self {
        Self::at(LOCAL_POINTER_SESSION, position)
    }

    /// Returns `true` if this is the reserved local-pointer session.
    pub fn is_local_pointer(&self) -> bool {
        self.session_id == LOCAL_POINTER_SESSION
    }
}

/// A mutation request for the session table.
///
/// Both the inbound protocol adapter and the local input adapter produce these;
/// the relay engine applies them at one point per output cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorEvent {
    /// A new session appeared.  Re-adding an existing id overwrites it.
    Added(CursorSession),
    /// A session moved.  Updating an unknown id inserts it.
    Updated(CursorSession),
    /// A session ended.  Only `session_id` is significant.
    Removed(CursorSession),
}

impl CursorEvent {
    /// Returns the session carried by this event.
    pub fn session(&self) -> &CursorSession {
        match self {
            CursorEvent::Added(s) | CursorEvent::Updated(s) | CursorEvent::Removed(s) => s,
        }
    }

    /// Returns the session id this event applies to.
    pub fn session_id(&self) -> SessionId {
        self.session().session_id
    }
}
