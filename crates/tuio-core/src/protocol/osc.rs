//! Binary codec for Open Sound Control (OSC 1.0) packets.
//!
//! TUIO rides on top of OSC, so every datagram the gateway sends or receives
//! passes through this module first.
//!
//! Wire format:
//! ```text
//! message := [address:str][type_tags:str][arg...]
//! bundle  := "#bundle\0" [timetag:8] ([size:4][packet:size])*
//! str     := UTF-8 bytes, NUL-terminated, zero-padded to a multiple of 4
//! blob    := [len:4][bytes][zero padding to a multiple of 4]
//! ```
//! All multi-byte numbers are big-endian.
//!
//! # Reading OSC bytes (for beginners)
//!
//! Every field is either a fixed-width big-endian number or a 4-byte-aligned
//! string.  A string always carries at least one NUL byte, so `"/abc"` (four
//! characters) occupies eight bytes on the wire.  The decoder checks every
//! declared length against the bytes actually present; a truncated datagram
//! yields an [`OscError`].

use thiserror::Error;

/// Marker that opens every OSC bundle, including its NUL terminator.
pub const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// The special OSC time tag meaning "process immediately".
pub const IMMEDIATE_TIMETAG: u64 = 1;

/// Nested bundles deeper than this are rejected.
const MAX_BUNDLE_DEPTH: usize = 16;

/// Errors that can occur while encoding or decoding OSC packets.
#[derive(Debug, Error, PartialEq)]
pub enum OscError {
    /// The byte slice ended before a complete field could be read.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// A string was not NUL-terminated within the packet.
    #[error("unterminated string at offset {0}")]
    UnterminatedString(usize),

    /// A string contained bytes that are not valid UTF-8.
    #[error("invalid UTF-8 in string at offset {0}")]
    InvalidUtf8(usize),

    /// A string to be encoded contains an interior NUL byte.
    #[error("string contains an interior NUL byte: {0:?}")]
    InteriorNul(String),

    /// The packet starts with neither `/` (message) nor `#bundle`.
    #[error("not an OSC packet: leading byte 0x{0:02X}")]
    NotOsc(u8),

    /// The message has no type tag string (pre-1.0 OSC), which is not supported.
    #[error("message {0} has no type tag string")]
    MissingTypeTags(String),

    /// The type tag string names a type this codec does not understand.
    #[error("unknown type tag '{0}'")]
    UnknownTypeTag(char),

    /// A bundle element declared a size that is negative, unaligned, or larger
    /// than the remaining data.
    #[error("invalid bundle element size {size} at offset {offset}")]
    InvalidElementSize { size: i32, offset: usize },

    /// A blob declared a negative length.
    #[error("invalid blob length {0}")]
    InvalidBlobLength(i32),

    /// Bundles are nested more deeply than the decoder allows.
    #[error("bundles nested too deeply")]
    NestingTooDeep,
}

// ── Packet model ──────────────────────────────────────────────────────────────

/// A single OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    /// `i`: 32-bit signed integer.
    Int(i32),
    /// `f`: 32-bit IEEE 754 float.
    Float(f32),
    /// `s`: string.
    Str(String),
    /// `b`: opaque byte blob.
    Blob(Vec<u8>),
    /// `h`: 64-bit signed integer.
    Long(i64),
    /// `d`: 64-bit IEEE 754 float.
    Double(f64),
    /// `T` / `F`: boolean carried entirely in the type tag.
    Bool(bool),
    /// `N`: nil.
    Nil,
    /// `I`: impulse ("infinitum").
    Impulse,
}

impl OscArg {
    fn type_tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Float(_) => 'f',
            OscArg::Str(_) => 's',
            OscArg::Blob(_) => 'b',
            OscArg::Long(_) => 'h',
            OscArg::Double(_) => 'd',
            OscArg::Bool(true) => 'T',
            OscArg::Bool(false) => 'F',
            OscArg::Nil => 'N',
            OscArg::Impulse => 'I',
        }
    }
}

/// An OSC message: an address pattern plus typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    /// Creates a message with no arguments.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument and returns `self` for chaining.
    pub fn with_arg(mut self, arg: OscArg) -> Self {
        self.args.push(arg);
        self
    }
}

/// An OSC bundle: a time tag plus an ordered list of packets.
#[derive(Debug, Clone, PartialEq)]
pub struct OscBundle {
    /// NTP-format time tag; [`IMMEDIATE_TIMETAG`] for "now".
    pub timetag: u64,
    pub content: Vec<OscPacket>,
}

impl OscBundle {
    /// Creates an empty bundle tagged for immediate processing.
    pub fn immediate() -> Self {
        Self {
            timetag: IMMEDIATE_TIMETAG,
            content: Vec::new(),
        }
    }

    /// Appends a message to the bundle.
    pub fn push(&mut self, msg: OscMessage) {
        self.content.push(OscPacket::Message(msg));
    }

    /// Iterates over every message in this bundle, descending into nested bundles
    /// in order.
    pub fn messages(&self) -> Vec<&OscMessage> {
        let mut out = Vec::new();
        collect_messages(&self.content, &mut out);
        out
    }
}

fn collect_messages<'a>(packets: &'a [OscPacket], out: &mut Vec<&'a OscMessage>) {
    for packet in packets {
        match packet {
            OscPacket::Message(m) => out.push(m),
            OscPacket::Bundle(b) => collect_messages(&b.content, out),
        }
    }
}

/// Top-level OSC packet: either a message or a bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum OscPacket {
    Message(OscMessage),
    Bundle(OscBundle),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`OscPacket`] into the bytes of one datagram.
///
/// # Errors
///
/// Returns [`OscError::InteriorNul`] if an address or string argument contains
/// a NUL byte, which OSC strings cannot represent.
///
/// # Examples
///
/// ```rust
/// use tuio_core::protocol::osc::{decode_packet, encode_packet, OscArg, OscMessage, OscPacket};
///
/// let msg = OscPacket::Message(OscMessage::new("/ping").with_arg(OscArg::Int(7)));
/// let bytes = encode_packet(&msg).unwrap();
/// assert_eq!(bytes.len() % 4, 0);
/// assert_eq!(decode_packet(&bytes).unwrap(), msg);
/// ```
pub fn encode_packet(packet: &OscPacket) -> Result<Vec<u8>, OscError> {
    let mut buf = Vec::with_capacity(64);
    match packet {
        OscPacket::Message(m) => encode_message(&mut buf, m)?,
        OscPacket::Bundle(b) => encode_bundle(&mut buf, b)?,
    }
    Ok(buf)
}

/// Decodes one complete datagram into an [`OscPacket`].
///
/// # Errors
///
/// Returns [`OscError`] if the bytes are not a well-formed OSC packet.
pub fn decode_packet(bytes: &[u8]) -> Result<OscPacket, OscError> {
    decode_packet_at_depth(bytes, 0)
}

// ── Encoding ──────────────────────────────────────────────────────────────────

fn encode_message(buf: &mut Vec<u8>, m: &OscMessage) -> Result<(), OscError> {
    write_padded_string(buf, &m.address)?;

    let mut tags = String::with_capacity(m.args.len() + 1);
    tags.push(',');
    tags.extend(m.args.iter().map(OscArg::type_tag));
    write_padded_string(buf, &tags)?;

    for arg in &m.args {
        match arg {
            OscArg::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Float(v) => buf.extend_from_slice(&v.to_bits().to_be_bytes()),
            OscArg::Str(s) => write_padded_string(buf, s)?,
            OscArg::Blob(bytes) => {
                buf.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                buf.extend_from_slice(bytes);
                pad_to_four(buf);
            }
            OscArg::Long(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Double(v) => buf.extend_from_slice(&v.to_bits().to_be_bytes()),
            OscArg::Bool(_) | OscArg::Nil | OscArg::Impulse => {} // tag only
        }
    }
    Ok(())
}

fn encode_bundle(buf: &mut Vec<u8>, b: &OscBundle) -> Result<(), OscError> {
    buf.extend_from_slice(BUNDLE_TAG);
    buf.extend_from_slice(&b.timetag.to_be_bytes());
    for element in &b.content {
        let bytes = encode_packet(element)?;
        buf.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
        buf.extend_from_slice(&bytes);
    }
    Ok(())
}

// ── Decoding ──────────────────────────────────────────────────────────────────

fn decode_packet_at_depth(bytes: &[u8], depth: usize) -> Result<OscPacket, OscError> {
    match bytes.first() {
        None => Err(OscError::InsufficientData {
            needed: 1,
            available: 0,
        }),
        Some(b'/') => decode_message(bytes).map(OscPacket::Message),
        Some(b'#') => decode_bundle(bytes, depth).map(OscPacket::Bundle),
        Some(&other) => Err(OscError::NotOsc(other)),
    }
}

fn decode_message(bytes: &[u8]) -> Result<OscMessage, OscError> {
    let (address, mut offset) = read_padded_string(bytes, 0)?;

    if offset >= bytes.len() || bytes[offset] != b',' {
        return Err(OscError::MissingTypeTags(address));
    }
    let (tags, next) = read_padded_string(bytes, offset)?;
    offset = next;

    let mut args = Vec::with_capacity(tags.len().saturating_sub(1));
    for tag in tags.chars().skip(1) {
        let arg = match tag {
            'i' => {
                let v = read_i32(bytes, offset)?;
                offset += 4;
                OscArg::Int(v)
            }
            'f' => {
                let v = f32::from_bits(read_i32(bytes, offset)? as u32);
                offset += 4;
                OscArg::Float(v)
            }
            's' | 'S' => {
                let (s, next) = read_padded_string(bytes, offset)?;
                offset = next;
                OscArg::Str(s)
            }
            'b' => {
                let len = read_i32(bytes, offset)?;
                if len < 0 {
                    return Err(OscError::InvalidBlobLength(len));
                }
                let start = offset + 4;
                let end = start + len as usize;
                require_len(bytes, end)?;
                offset = align_four(end);
                OscArg::Blob(bytes[start..end].to_vec())
            }
            'h' | 't' => {
                let v = read_u64(bytes, offset)? as i64;
                offset += 8;
                OscArg::Long(v)
            }
            'd' => {
                let v = f64::from_bits(read_u64(bytes, offset)?);
                offset += 8;
                OscArg::Double(v)
            }
            'T' => OscArg::Bool(true),
            'F' => OscArg::Bool(false),
            'N' => OscArg::Nil,
            'I' => OscArg::Impulse,
            other => return Err(OscError::UnknownTypeTag(other)),
        };
        args.push(arg);
    }

    Ok(OscMessage { address, args })
}

fn decode_bundle(bytes: &[u8], depth: usize) -> Result<OscBundle, OscError> {
    if depth >= MAX_BUNDLE_DEPTH {
        return Err(OscError::NestingTooDeep);
    }
    require_len(bytes, 16)?;
    if &bytes[..8] != BUNDLE_TAG {
        return Err(OscError::NotOsc(bytes[0]));
    }
    let timetag = read_u64(bytes, 8)?;

    let mut content = Vec::new();
    let mut offset = 16;
    while offset < bytes.len() {
        let size = read_i32(bytes, offset)?;
        let start = offset + 4;
        if size < 0 || size % 4 != 0 || start + size as usize > bytes.len() {
            return Err(OscError::InvalidElementSize { size, offset });
        }
        let end = start + size as usize;
        content.push(decode_packet_at_depth(&bytes[start..end], depth + 1)?);
        offset = end;
    }

    Ok(OscBundle { timetag, content })
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize) -> Result<(), OscError> {
    if buf.len() < needed {
        Err(OscError::InsufficientData {
            needed,
            available: buf.len(),
        })
    } else {
        Ok(())
    }
}

fn read_i32(buf: &[u8], offset: usize) -> Result<i32, OscError> {
    require_len(buf, offset + 4)?;
    Ok(i32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

fn read_u64(buf: &[u8], offset: usize) -> Result<u64, OscError> {
    require_len(buf, offset + 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[offset..offset + 8]);
    Ok(u64::from_be_bytes(raw))
}

/// Reads a NUL-terminated, 4-byte-aligned string starting at `offset`.
///
/// Returns the string and the offset of the first byte after its padding.
fn read_padded_string(buf: &[u8], offset: usize) -> Result<(String, usize), OscError> {
    let rest = buf.get(offset..).unwrap_or_default();
    let nul = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(OscError::UnterminatedString(offset))?;
    let s = std::str::from_utf8(&rest[..nul])
        .map_err(|_| OscError::InvalidUtf8(offset))?
        .to_string();
    // The padded length includes the terminator; a missing tail of padding at
    // the very end of a datagram is tolerated.
    let next = (offset + align_four(nul + 1)).min(buf.len());
    Ok((s, next))
}

fn write_padded_string(buf: &mut Vec<u8>, s: &str) -> Result<(), OscError> {
    if s.as_bytes().contains(&0) {
        return Err(OscError::InteriorNul(s.to_string()));
    }
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    pad_to_four(buf);
    Ok(())
}

fn pad_to_four(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

fn align_four(n: usize) -> usize {
    (n + 3) & !3
}

// ── Tests ─────────────────────────────────────────────────────────────────────
