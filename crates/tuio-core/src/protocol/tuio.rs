//! TUIO 1.x 2D-cursor profile (`/tuio/2Dcur`) on top of OSC.
//!
//! A TUIO *frame* is one OSC bundle whose messages all share the profile
//! address and differ by their first (string) argument, the command:
//!
//! | Command  | Arguments                         | Meaning                          |
//! |----------|-----------------------------------|----------------------------------|
//! | `source` | `s` name                          | Optional sender name (TUIO 1.1)  |
//! | `set`    | `i` id, `f` x, y, X, Y, m         | State of one cursor              |
//! | `alive`  | `i`…                              | Every id live in this frame      |
//! | `fseq`   | `i` frame                         | Frame number, closes the frame   |
//!
//! Outbound frames are always `set`*, `alive`, `fseq`, in that order.

use thiserror::Error;

use crate::domain::cursor::{CursorSession, SessionId, Vec2};
use crate::protocol::osc::{
    decode_packet, encode_packet, OscArg, OscBundle, OscError, OscMessage, OscPacket,
};

/// OSC address of the 2D-cursor profile.
pub const CURSOR_2D_PROFILE: &str = "/tuio/2Dcur";

/// Prefix shared by every TUIO profile address.
const TUIO_PREFIX: &str = "/tuio/";

/// Errors that can occur while interpreting a datagram as a TUIO cursor frame.
#[derive(Debug, Error, PartialEq)]
pub enum TuioError {
    /// The datagram is not valid OSC.
    #[error("malformed OSC: {0}")]
    Osc(#[from] OscError),

    /// The datagram carries a profile other than `/tuio/2Dcur`.
    #[error("unsupported profile: {0}")]
    UnsupportedProfile(String),

    /// A `/tuio/2Dcur` message has no command string.
    #[error("2Dcur message without a command")]
    MissingCommand,

    /// A `/tuio/2Dcur` message names a command this profile does not define.
    #[error("unknown 2Dcur command: {0}")]
    UnknownCommand(String),

    /// A command's arguments have the wrong count or types.
    #[error("bad arguments for '{command}': {reason}")]
    BadArguments {
        command: &'static str,
        reason: String,
    },
}

/// The payload of one `set` message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorSet {
    pub session_id: SessionId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: f32,
}

impl CursorSet {
    /// Builds a `set` payload from a (possibly remapped) session.
    pub fn from_session(session: &CursorSession) -> Self {
        Self {
            session_id: session.session_id,
            position: session.position,
            velocity: session.velocity,
            acceleration: session.acceleration,
        }
    }

    /// Turns a received `set` into a session tagged with `source`.
    pub fn into_session(self, source: &str) -> CursorSession {
        CursorSession {
            session_id: self.session_id,
            source: source.to_string(),
            position: self.position,
            velocity: self.velocity,
            acceleration: self.acceleration,
        }
    }
}

/// One `/tuio/2Dcur` message.
#[derive(Debug, Clone, PartialEq)]
pub enum TuioMessage {
    Source(String),
    Set(CursorSet),
    Alive(Vec<SessionId>),
    Fseq(i32),
}

impl TuioMessage {
    /// Converts this message into its OSC form.
    pub fn to_osc(&self) -> OscMessage {
        let msg = OscMessage::new(CURSOR_2D_PROFILE);
        match self {
            TuioMessage::Source(name) => msg
                .with_arg(OscArg::Str("source".into()))
                .with_arg(OscArg::Str(name.clone())),
            TuioMessage::Set(c) => msg
                .with_arg(OscArg::Str("set".into()))
                .with_arg(OscArg::Int(c.session_id))
                .with_arg(OscArg::Float(c.position.x))
                .with_arg(OscArg::Float(c.position.y))
                .with_arg(OscArg::Float(c.velocity.x))
                .with_arg(OscArg::Float(c.velocity.y))
                .with_arg(OscArg::Float(c.acceleration)),
            TuioMessage::Alive(ids) => {
                let mut msg = msg.with_arg(OscArg::Str("alive".into()));
                msg.args.extend(ids.iter().map(|&id| OscArg::Int(id)));
                msg
            }
            TuioMessage::Fseq(frame) => msg
                .with_arg(OscArg::Str("fseq".into()))
                .with_arg(OscArg::Int(*frame)),
        }
    }

    /// Interprets an OSC message addressed to `/tuio/2Dcur`.
    ///
    /// # Errors
    ///
    /// Returns [`TuioError::UnsupportedProfile`] for any other address, and
    /// the other [`TuioError`] variants for malformed commands.
    pub fn from_osc(msg: &OscMessage) -> Result<Self, TuioError> {
        if msg.address != CURSOR_2D_PROFILE {
            return Err(TuioError::UnsupportedProfile(msg.address.clone()));
        }
        let (command, args) = match msg.args.split_first() {
            Some((OscArg::Str(command), rest)) => (command.as_str(), rest),
            _ => return Err(TuioError::MissingCommand),
        };

        match command {
            "source" => match args {
                [OscArg::Str(name), ..] => Ok(TuioMessage::Source(name.clone())),
                _ => Err(bad_args("source", "expected a string")),
            },
            "set" => decode_set(args).map(TuioMessage::Set),
            "alive" => args
                .iter()
                .map(|a| match a {
                    OscArg::Int(id) => Ok(*id),
                    other => Err(bad_args("alive", format!("non-integer id {other:?}"))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(TuioMessage::Alive),
            "fseq" => match args {
                [OscArg::Int(frame), ..] => Ok(TuioMessage::Fseq(*frame)),
                _ => Err(bad_args("fseq", "expected an integer frame number")),
            },
            other => Err(TuioError::UnknownCommand(other.to_string())),
        }
    }
}

fn decode_set(args: &[OscArg]) -> Result<CursorSet, TuioError> {
    let [id, x, y, vx, vy, m, ..] = args else {
        return Err(bad_args("set", format!("expected 6 arguments, got {}", args.len())));
    };
    let session_id = match id {
        OscArg::Int(v) => *v,
        other => return Err(bad_args("set", format!("non-integer session id {other:?}"))),
    };
    Ok(CursorSet {
        session_id,
        position: Vec2::new(arg_f32(x)?, arg_f32(y)?),
        velocity: Vec2::new(arg_f32(vx)?, arg_f32(vy)?),
        acceleration: arg_f32(m)?,
    })
}

/// Some trackers send whole numbers as `i`; accept both.
fn arg_f32(arg: &OscArg) -> Result<f32, TuioError> {
    match arg {
        OscArg::Float(v) => Ok(*v),
        OscArg::Int(v) => Ok(*v as f32),
        OscArg::Double(v) => Ok(*v as f32),
        other => Err(bad_args("set", format!("non-numeric field {other:?}"))),
    }
}

fn bad_args(command: &'static str, reason: impl Into<String>) -> TuioError {
    TuioError::BadArguments {
        command,
        reason: reason.into(),
    }
}

// ── Frames ────────────────────────────────────────────────────────────────────

/// The 2Dcur content of one inbound datagram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TuioFrame {
    /// Sender name from a `source` message, if any.
    pub source: Option<String>,
    /// Every `set` in datagram order.
    pub sets: Vec<CursorSet>,
    /// The `alive` list; `None` when the datagram carried no `alive`.
    pub alive: Option<Vec<SessionId>>,
    /// The frame number; `None` when the datagram carried no `fseq`.
    pub fseq: Option<i32>,
}

/// Decodes one datagram into a [`TuioFrame`].
///
/// Messages for other addresses inside a bundle are skipped.  A datagram that
/// contains no `/tuio/2Dcur` message at all is rejected.
///
/// # Errors
///
/// Returns [`TuioError`] for malformed OSC, for datagrams carrying only other
/// profiles (`/tuio/2Dobj`, `/tuio/2Dblb`, `/tuio/3D*`, …) or unrelated
/// addresses, and for malformed 2Dcur commands.
pub fn decode_frame(bytes: &[u8]) -> Result<TuioFrame, TuioError> {
    let packet = decode_packet(bytes)?;
    let messages: Vec<&OscMessage> = match &packet {
        OscPacket::Message(m) => vec![m],
        OscPacket::Bundle(b) => b.messages(),
    };

    let mut frame = TuioFrame::default();
    let mut first_foreign: Option<&str> = None;
    let mut saw_profile = false;

    for msg in messages {
        if msg.address != CURSOR_2D_PROFILE {
            if first_foreign.is_none() {
                first_foreign = Some(msg.address.as_str());
            }
            continue;
        }
        saw_profile = true;
        match TuioMessage::from_osc(msg)? {
            TuioMessage::Source(name) => frame.source = Some(name),
            TuioMessage::Set(set) => frame.sets.push(set),
            TuioMessage::Alive(ids) => frame.alive = Some(ids),
            TuioMessage::Fseq(f) => frame.fseq = Some(f),
        }
    }

    if !saw_profile {
        let address = first_foreign.unwrap_or(TUIO_PREFIX).to_string();
        return Err(TuioError::UnsupportedProfile(address));
    }
    Ok(frame)
}

/// Builds the outbound bundle for one cycle: one `set` per cursor, then
/// `alive` with exactly those ids, then `fseq`.
pub fn build_cursor_bundle(cursors: &[CursorSession], fseq: i32) -> OscBundle {
    let mut bundle = OscBundle::immediate();
    let mut alive = Vec::with_capacity(cursors.len());
    for cursor in cursors {
        bundle.push(TuioMessage::Set(CursorSet::from_session(cursor)).to_osc());
        alive.push(cursor.session_id);
    }
    bundle.push(TuioMessage::Alive(alive).to_osc());
    bundle.push(TuioMessage::Fseq(fseq).to_osc());
    bundle
}

/// Encodes the outbound bundle for one cycle into datagram bytes.
///
/// # Errors
///
/// Returns [`OscError`] only if a string cannot be represented in OSC, which
/// cannot happen for the fixed addresses and commands used here.
pub fn encode_cursor_bundle(cursors: &[CursorSession], fseq: i32) -> Result<Vec<u8>, OscError> {
    encode_packet(&OscPacket::Bundle(build_cursor_bundle(cursors, fseq)))
}
