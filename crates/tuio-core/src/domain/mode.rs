//! Gateway operating modes and the relay state derived from them.
//!
//! A [`Mode`] is what the operator asked for; a [`RelayState`] is what the
//! gateway actually achieved after binding sockets.  They differ when a bind
//! fails: a Router whose inbound port is taken ends up `Sending` only.
//!
//! ```text
//!                connect(mode)
//!   Idle ───────────────────────────► Receiving | Sending | Routing | RandomSending
//!     ▲                                         │
//!     └──────── every bind failed ◄─────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The role requested for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Listen for inbound cursors only.
    Receiver,
    /// Send the local table (local pointer) outbound only.
    Sender,
    /// Listen and re-emit a partitioned subset.
    #[default]
    Router,
    /// Send one random synthetic cursor per cycle.
    RandomSender,
}

/// Error returned when a mode name cannot be parsed.
#[derive(Debug, Error, PartialEq)]
#[error("unknown mode '{0}' (expected receiver, sender, router, random or 0-3)")]
pub struct ParseModeError(pub String);

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Receiver, Mode::Sender, Mode::Router, Mode::RandomSender];

    /// Maps a configuration index onto a mode, clamping out-of-range values.
    pub fn from_index(index: i64) -> Self {
        let clamped = index.clamp(0, Self::ALL.len() as i64 - 1);
        Self::ALL[clamped as usize]
    }

    /// Returns this mode's configuration index.
    pub fn index(self) -> i64 {
        match self {
            Mode::Receiver => 0,
            Mode::Sender => 1,
            Mode::Router => 2,
            Mode::RandomSender => 3,
        }
    }

    /// Whether this mode binds the inbound listener.
    pub fn listens(self) -> bool {
        !matches!(self, Mode::Sender | Mode::RandomSender)
    }

    /// Whether this mode binds the outbound socket.
    pub fn sends(self) -> bool {
        self != Mode::Receiver
    }

    /// Title shown at the start of the status line.
    pub fn title(self) -> &'static str {
        match self {
            Mode::Receiver => "TuioGateway - Receiver Mode",
            Mode::Sender => "TuioGateway - Sender Mode",
            Mode::Router => "TuioGateway - Router Mode",
            Mode::RandomSender => "TuioGateway - Random Sender Mode",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Receiver => "receiver",
            Mode::Sender => "sender",
            Mode::Router => "router",
            Mode::RandomSender => "random",
        };
        f.write_str(name)
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "receiver" | "client" => Ok(Mode::Receiver),
            "sender" | "server" => Ok(Mode::Sender),
            "router" => Ok(Mode::Router),
            "random" | "random-sender" | "randomsender" => Ok(Mode::RandomSender),
            other => other
                .parse::<i64>()
                .map(Mode::from_index)
                .map_err(|_| ParseModeError(s.to_string())),
        }
    }
}

/// What the gateway is actually doing after the last connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayState {
    /// No socket bound.
    #[default]
    Idle,
    /// Inbound listener only.
    Receiving,
    /// Outbound socket only.
    Sending,
    /// Inbound listener and outbound socket.
    Routing,
    /// Outbound socket plus the random cursor generator.
    RandomSending,
}

impl RelayState {
    /// Derives the state from the requested mode and which binds succeeded.
    ///
    /// Binds the mode does not ask for are ignored.
    pub fn from_bindings(mode: Mode, inbound_bound: bool, outbound_bound: bool) -> Self {
        let inbound = mode.listens() && inbound_bound;
        let outbound = mode.sends() && outbound_bound;
        match (inbound, outbound) {
            (false, false) => RelayState::Idle,
            (true, false) => RelayState::Receiving,
            (true, true) => RelayState::Routing,
            (false, true) if mode == Mode::RandomSender => RelayState::RandomSending,
            (false, true) => RelayState::Sending,
        }
    }

    /// Whether the output cycle should route and transmit.
    pub fn is_sending(self) -> bool {
        matches!(
            self,
            RelayState::Sending | RelayState::Routing | RelayState::RandomSending
        )
    }

    /// Whether the output cycle should inject a random cursor.
    pub fn generates_random(self) -> bool {
        self == RelayState::RandomSending
    }
}
