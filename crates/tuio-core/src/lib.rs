//! # tuio-core
//!
//! Shared library for the TUIO gateway containing the OSC/TUIO codec, the
//! cursor session model, and the display partition arithmetic.
//!
//! It has no dependencies on sockets, threads, or files; the `tuio-gateway`
//! crate wires it to the network.
//!
//! # Architecture overview (for beginners)
//!
//! TUIO is a small protocol that multitouch trackers use to publish finger
//! positions.  Each UDP datagram is an OSC *bundle* describing one frame:
//! where every cursor is, which cursors are still alive, and a frame number.
//!
//! The gateway sits between a tracker and one or more displays.  It receives
//! frames, keeps a table of live cursors, and re-emits them, optionally
//! slicing a wide touch surface into vertical tiles so that each display only
//! sees the cursors that fall on its own slice.
//!
//! This crate defines:
//!
//! - **`protocol`** – How bytes travel over the network.  OSC packets are
//!   encoded by hand (big-endian, 4-byte aligned) and TUIO `/tuio/2Dcur`
//!   messages are built on top of them.  The frame tracker turns inbound
//!   frames into typed add/update/remove events.
//!
//! - **`domain`** – Pure relay logic.  The `SessionTable` of live cursors, the
//!   `DisplayPartition` tile remap, and the operating `Mode`.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `tuio_core::SessionTable` instead of `tuio_core::domain::session_table::SessionTable`.
pub use domain::cursor::{CursorEvent, CursorSession, SessionId, Vec2, LOCAL_POINTER_SESSION};
pub use domain::mode::{Mode, ParseModeError, RelayState};
pub use domain::partition::{DisplayPartition, MAX_TILES};
pub use domain::session_table::SessionTable;
pub use domain::settings::{OscMirrorSettings, RelaySettings};
pub use protocol::frame_tracker::FrameTracker;
pub use protocol::sequence::FrameSequence;
pub use protocol::tuio::{decode_frame, encode_cursor_bundle, TuioError, TuioFrame};
