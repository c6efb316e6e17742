//! Application layer use cases for the gateway.
//!
//! # What is the "application" layer? (for beginners)
//!
//! The application layer sits between the domain types in `tuio-core` (pure
//! relay rules) and the infrastructure (sockets, threads, files).  Code here
//! orchestrates domain objects, depends on traits rather than sockets, and
//! never performs OS calls itself.
//!
//! # Sub-modules
//!
//! - **`operation_queue`** – The bounded FIFO through which every table
//!   mutation travels.  Drained once per cycle.
//!
//! - **`local_input`** – Publishes the latest pointer down/drag/up state for
//!   the reserved local-pointer session; the engine reconciles it each cycle.
//!
//! - **`route_cursors`** – Partitions a table snapshot and encodes the TUIO
//!   bundle (and the optional plain-OSC mirror).
//!
//! - **`random_cursor`** – Synthetic cursor for RandomSender mode.
//!
//! - **`relay_cycle`** – The `RelayEngine` that runs one output cycle: drain,
//!   reconcile, snapshot, route, encode, transmit.  This is the hot path, run
//!   at the configured frame rate.

pub mod local_input;
pub mod operation_queue;
pub mod random_cursor;
pub mod relay_cycle;
pub mod route_cursors;
