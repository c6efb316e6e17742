//! Human-readable connection status line.
//!
//! ```text
//! TuioGateway - Router Mode | listen at #3333 | sending to 127.0.0.1: #3334
//! TuioGateway - Router Mode | [FAIL] | sending to 127.0.0.1: #3334
//! ```
//!
//! The mode controller builds one [`ConnectionStatus`] per connect; the CLI
//! prints it together with the relay engine's last send outcome.

use std::fmt;

use tuio_core::Mode;

/// Shown before the first connect.
pub const IDLE_STATUS: &str = "idle..type 'connect' to start";

/// Marker appended for every socket that failed to bind.
pub const FAIL_MARKER: &str = "[FAIL]";

/// One `| …` segment of the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Listening(u16),
    Sending {
        host: String,
        port: u16,
        mirror_port: Option<u16>,
    },
    Failed,
}

/// The outcome of the most recent connect, rendered with `Display`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    mode: Option<Mode>,
    segments: Vec<Segment>,
}

impl ConnectionStatus {
    /// Status before any connect.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Starts a fresh status for a connect attempt in `mode`.
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            mode: Some(mode),
            segments: Vec::new(),
        }
    }

    pub fn listening(&mut self, port: u16) {
        self.segments.push(Segment::Listening(port));
    }

    pub fn sending(&mut self, host: &str, port: u16, mirror_port: Option<u16>) {
        self.segments.push(Segment::Sending {
            host: host.to_string(),
            port,
            mirror_port,
        });
    }

    pub fn failed(&mut self) {
        self.segments.push(Segment::Failed);
    }

    /// Whether any bind in the last connect failed.
    pub fn has_failure(&self) -> bool {
        self.segments.contains(&Segment::Failed)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(mode) = self.mode else {
            return f.write_str(IDLE_STATUS);
        };
        f.write_str(mode.title())?;
        for segment in &self.segments {
            match segment {
                Segment::Listening(port) => write!(f, " | listen at #{port}")?,
                Segment::Sending {
                    host,
                    port,
                    mirror_port,
                } => {
                    write!(f, " | sending to {host}: #{port}")?;
                    if let Some(mirror) = mirror_port {
                        write!(f, " | #{mirror}")?;
                    }
                }
                Segment::Failed => write!(f, " | {FAIL_MARKER}")?,
            }
        }
        Ok(())
    }
}
