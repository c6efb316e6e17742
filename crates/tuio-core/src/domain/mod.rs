//! Domain entities for the TUIO gateway.
//!
//! This module contains pure relay logic with no infrastructure dependencies:
//! no sockets, no threads, no files.
//!
//! # What lives here? (for beginners)
//!
//! - **`cursor`** – the [`cursor::CursorSession`] entity and the typed
//!   [`cursor::CursorEvent`] used to mutate the table.
//! - **`session_table`** – the map of live cursors, keyed by session id.
//! - **`partition`** – the tile arithmetic that slices the shared surface
//!   across several downstream displays.
//! - **`mode`** – the requested [`mode::Mode`] and the achieved
//!   [`mode::RelayState`].
//! - **`settings`** – the frozen configuration snapshot handed to the relay.
//!
//! Code in outer layers (the `tuio-gateway` application and infrastructure)
//! depends on these types; they never depend on it.

pub mod cursor;
pub mod mode;
pub mod partition;
pub mod session_table;
pub mod settings;
