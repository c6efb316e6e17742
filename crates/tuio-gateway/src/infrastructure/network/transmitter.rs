//! Outbound UDP transmitter.
//!
//! The socket is bound synchronously with `std::net` (so a bind failure is
//! reported immediately to the mode controller), connected to the resolved
//! destination, and then handed to Tokio for async sends.  Because the socket
//! is connected, each [`BundleTransmitter::transmit`] is a single `send` of one
//! whole datagram.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket as StdUdpSocket};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::info;

use super::BindError;
use crate::application::relay_cycle::{BundleTransmitter, TransmitError};

/// A UDP socket bound locally and connected to one remote destination.
#[derive(Debug)]
pub struct UdpTransmitter {
    socket: UdpSocket,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
}

impl UdpTransmitter {
    /// Binds `0.0.0.0:local_port` (0 = ephemeral) and connects it to
    /// `host:port`.
    ///
    /// Must be called from within a Tokio runtime.  If any step fails the
    /// partially set-up socket is dropped before returning.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Resolve`] if `host` does not resolve to an IPv4
    /// address, and [`BindError::Outbound`] if binding or connecting fails.
    pub fn connect(local_port: u16, host: &str, port: u16) -> Result<Self, BindError> {
        let remote_addr = resolve_ipv4(host, port)?;
        let bind_addr = SocketAddr::from(([0, 0, 0, 0], local_port));
        let outbound = |source: std::io::Error| BindError::Outbound {
            addr: bind_addr,
            source,
        };

        let std_socket = StdUdpSocket::bind(bind_addr).map_err(outbound)?;
        std_socket.connect(remote_addr).map_err(outbound)?;
        std_socket.set_nonblocking(true).map_err(outbound)?;
        let local_addr = std_socket.local_addr().map_err(outbound)?;
        let socket = UdpSocket::from_std(std_socket).map_err(outbound)?;

        info!("outbound socket {local_addr} connected to {remote_addr}");
        Ok(Self {
            socket,
            local_addr,
            remote_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

#[async_trait]
impl BundleTransmitter for UdpTransmitter {
    async fn transmit(&self, datagram: &[u8]) -> Result<(), TransmitError> {
        self.socket.send(datagram).await?;
        Ok(())
    }
}

/// Resolves `host:port`, preferring the first IPv4 result since the socket is
/// bound on `0.0.0.0`.
fn resolve_ipv4(host: &str, port: u16) -> Result<SocketAddr, BindError> {
    let unresolved = || BindError::Resolve {
        host: host.to_string(),
        port,
    };
    (host, port)
        .to_socket_addrs()
        .map_err(|_| unresolved())?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(unresolved)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
