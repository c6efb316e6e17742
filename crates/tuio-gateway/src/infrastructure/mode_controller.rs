//! Mode controller: owns the gateway's sockets and the achieved relay state.
//!
//! # Transition (for beginners)
//!
//! Every call to [`ModeController::connect`] runs the same steps, whatever the
//! previous state was:
//!
//! 1. **Release** the inbound listener (joining its thread) and both outbound
//!    sockets.  Nothing new is bound until the old sockets are gone, so
//!    reconnecting on the same port never races with itself.  The removals
//!    the listener hands back are held until the owner collects them with
//!    [`ModeController::take_released`].
//! 2. **Bind inbound** on `0.0.0.0:local_tuio_port` unless the mode only sends.
//! 3. **Bind outbound** on `0.0.0.0:sender_local_port` and connect it to the
//!    remote receiver unless the mode only receives.  When the plain-OSC
//!    mirror is enabled a second socket is connected to its port.
//! 4. **Derive** the [`RelayState`] from what actually bound.
//! 5. **Compose** the status line.
//!
//! A failed bind is logged and shown as `[FAIL]` in the status line; it never
//! propagates.  Running `connect` again is the retry.

use std::net::SocketAddr;

use tracing::{error, info, warn};
use tuio_core::{CursorEvent, RelaySettings, RelayState};

use super::network::listener::InboundListener;
use super::network::transmitter::UdpTransmitter;
use super::status::ConnectionStatus;
use crate::application::operation_queue::QueueSender;
use crate::application::relay_cycle::{BundleTransmitter, CycleOutputs};

/// Socket owner and state machine over `{Idle, Receiving, Sending, Routing,
/// RandomSending}`.
#[derive(Debug, Default)]
pub struct ModeController {
    state: RelayState,
    status: ConnectionStatus,
    listener: Option<InboundListener>,
    tuio_out: Option<UdpTransmitter>,
    mirror_out: Option<UdpTransmitter>,
    /// Removals returned by closed listeners, not yet applied to the table.
    released: Vec<CursorEvent>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Address of the bound inbound listener, if any.
    pub fn inbound_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(InboundListener::local_addr)
    }

    /// Local address of the bound outbound TUIO socket, if any.
    pub fn outbound_addr(&self) -> Option<SocketAddr> {
        self.tuio_out.as_ref().map(UdpTransmitter::local_addr)
    }

    /// Lends the outbound sockets to one relay cycle.
    pub fn outputs(&self) -> CycleOutputs<'_> {
        CycleOutputs {
            tuio: self
                .tuio_out
                .as_ref()
                .map(|t| t as &dyn BundleTransmitter),
            mirror: self
                .mirror_out
                .as_ref()
                .map(|t| t as &dyn BundleTransmitter),
        }
    }

    /// Drops every socket and returns to `Idle`.
    ///
    /// Blocks until the listener thread has exited.
    pub fn release(&mut self) {
        if let Some(listener) = self.listener.take() {
            self.released.extend(listener.close());
        }
        self.tuio_out = None;
        self.mirror_out = None;
        self.state = RelayState::Idle;
    }

    /// Hands over the removals collected by [`release`](Self::release).
    pub fn take_released(&mut self) -> Vec<CursorEvent> {
        std::mem::take(&mut self.released)
    }

    /// Re-acquires sockets for `settings.mode` and returns the achieved state.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&mut self, settings: &RelaySettings, queue: &QueueSender) -> RelayState {
        self.release();

        let mode = settings.mode;
        let mut status = ConnectionStatus::for_mode(mode);

        if mode.listens() {
            match InboundListener::bind(settings.local_tuio_port, queue.clone()) {
                Ok(listener) => {
                    status.listening(listener.local_addr().port());
                    self.listener = Some(listener);
                }
                Err(e) => {
                    error!("{e}");
                    status.failed();
                }
            }
        }

        if mode.sends() {
            match UdpTransmitter::connect(
                settings.sender_local_port,
                &settings.remote_host,
                settings.remote_tuio_port,
            ) {
                Ok(transmitter) => {
                    self.tuio_out = Some(transmitter);
                    self.mirror_out = settings
                        .osc_mirror
                        .as_ref()
                        .and_then(|mirror| {
                            UdpTransmitter::connect(0, &settings.remote_host, mirror.remote_port)
                                .map_err(|e| warn!("OSC mirror disabled: {e}"))
                                .ok()
                        });
                    let mirror_port = self
                        .mirror_out
                        .as_ref()
                        .map(|m| m.remote_addr().port());
                    status.sending(&settings.remote_host, settings.remote_tuio_port, mirror_port);
                }
                Err(e) => {
                    error!("{e}");
                    status.failed();
                }
            }
        }

        self.state =
            RelayState::from_bindings(mode, self.listener.is_some(), self.tuio_out.is_some());
        self.status = status;
        info!("mode {mode} connected: {:?} ({})", self.state, self.status);
        self.state
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
