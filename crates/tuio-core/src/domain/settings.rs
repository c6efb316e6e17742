//! Immutable relay settings snapshot.
//!
//! The persisted configuration can change at any time (CLI command, config
//! reload).  The relay never reads it directly: each connect and each output
//! cycle receives a [`RelaySettings`] value built once, with every range
//! already clamped.

use std::time::Duration;

use super::mode::Mode;
use super::partition::DisplayPartition;

/// Lowest and highest accepted output cycle rates, in cycles per second.
pub const MIN_FRAME_RATE_HZ: u32 = 1;
pub const MAX_FRAME_RATE_HZ: u32 = 1000;

/// Settings for the optional plain-OSC cursor mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscMirrorSettings {
    /// Destination port on the remote host.
    pub remote_port: u16,
    /// Cursors beyond this count are not mirrored.
    pub max_cursor_count: usize,
}

/// Everything the mode controller and the output cycle need, frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaySettings {
    pub mode: Mode,
    /// UDP port the inbound listener binds.
    pub local_tuio_port: u16,
    /// Hostname or IP address of the downstream receiver.
    pub remote_host: String,
    pub remote_tuio_port: u16,
    /// Local port the outbound socket binds; `0` picks an ephemeral port.
    pub sender_local_port: u16,
    pub partition: DisplayPartition,
    /// Time between output cycles.
    pub frame_interval: Duration,
    /// `Some` when plain-OSC mirroring is enabled.
    pub osc_mirror: Option<OscMirrorSettings>,
}

impl RelaySettings {
    /// Converts a cycle rate into an interval, clamping the rate first.
    pub fn interval_for_rate(frame_rate_hz: u32) -> Duration {
        let hz = frame_rate_hz.clamp(MIN_FRAME_RATE_HZ, MAX_FRAME_RATE_HZ);
        Duration::from_micros(1_000_000 / u64::from(hz))
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            local_tuio_port: 3333,
            remote_host: "127.0.0.1".to_string(),
            remote_tuio_port: 3334,
            sender_local_port: 0,
            partition: DisplayPartition::default(),
            frame_interval: Self::interval_for_rate(60),
            osc_mirror: None,
        }
    }
}
