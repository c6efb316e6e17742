//! Infrastructure layer for the gateway.
//!
//! Contains OS-facing adapters: UDP sockets, the mode controller that owns
//! them, file-system storage, and the stdin console.
//!
//! **Dependency rule**: this layer may depend on `application` and `tuio_core`,
//! but MUST NOT be imported by the `application` or domain layers.

pub mod console;
pub mod gateway;
pub mod mode_controller;
pub mod network;
pub mod status;
pub mod storage;
