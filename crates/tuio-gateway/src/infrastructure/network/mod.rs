//! Network infrastructure for the gateway.
//!
//! # Sub-modules
//!
//! - **`listener`** – Binds the inbound TUIO port and runs the receive thread
//!   that decodes datagrams into cursor events for the operation queue.
//!
//! - **`transmitter`** – A connected outbound UDP socket implementing
//!   [`BundleTransmitter`](crate::application::relay_cycle::BundleTransmitter).

pub mod listener;
pub mod transmitter;

use std::net::SocketAddr;

use thiserror::Error;

/// Error type for socket acquisition during a mode transition.
#[derive(Debug, Error)]
pub enum BindError {
    /// The inbound listener could not be started on `addr`.
    #[error("failed to bind TUIO listener on {addr}: {source}")]
    Inbound {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The outbound socket could not be bound on `addr` or connected.
    #[error("failed to open outbound socket on {addr}: {source}")]
    Outbound {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The remote host did not resolve to any address.
    #[error("could not resolve {host}:{port}")]
    Resolve { host: String, port: u16 },
}
