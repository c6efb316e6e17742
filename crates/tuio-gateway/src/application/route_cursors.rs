//! Partition routing and outbound datagram assembly for one output cycle.
//!
//! Given a snapshot of the session table, this use case:
//!
//! 1. remaps and filters it into the configured display tile
//!    ([`DisplayPartition::route`]);
//! 2. encodes the survivors as one TUIO bundle (`set`*, `alive`, `fseq`);
//! 3. optionally encodes each survivor as a plain-OSC `/cursor/<n>/{x,y}`
//!    bundle for receivers that do not speak TUIO.
//!
//! Nothing here touches a socket; the relay engine hands the bytes to a
//! [`BundleTransmitter`](super::relay_cycle::BundleTransmitter).

use tuio_core::protocol::osc::{encode_packet, OscArg, OscBundle, OscError, OscMessage, OscPacket};
use tuio_core::{encode_cursor_bundle, CursorSession, DisplayPartition};

/// The routed cursors and encoded TUIO datagram for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundFrame {
    /// Cursors that survived the partition filter, already remapped.
    pub cursors: Vec<CursorSession>,
    pub fseq: i32,
    /// The complete bundle, ready to send as one datagram.
    pub datagram: Vec<u8>,
}

/// Routes `snapshot` through `partition` and encodes the result.
///
/// # Errors
///
/// Returns [`OscError`] if encoding fails, which the fixed TUIO addresses
/// never trigger.
pub fn build_outbound_frame(
    snapshot: &[CursorSession],
    partition: &DisplayPartition,
    fseq: i32,
) -> Result<OutboundFrame, OscError> {
    let cursors = partition.route(snapshot);
    let datagram = encode_cursor_bundle(&cursors, fseq)?;
    Ok(OutboundFrame {
        cursors,
        fseq,
        datagram,
    })
}

/// Address of the plain-OSC mirror message for one cursor axis.
fn mirror_address(index: usize, axis: &str) -> String {
    format!("/cursor/{index}/{axis}")
}

/// Encodes up to `max_cursor_count` routed cursors as plain-OSC bundles, one
/// datagram per cursor, indexed in routing order.
///
/// # Errors
///
/// Returns [`OscError`] if encoding fails.
pub fn encode_osc_mirror(
    cursors: &[CursorSession],
    max_cursor_count: usize,
) -> Result<Vec<Vec<u8>>, OscError> {
    cursors
        .iter()
        .take(max_cursor_count)
        .enumerate()
        .map(|(index, cursor)| {
            let mut bundle = OscBundle::immediate();
            bundle.push(
                OscMessage::new(mirror_address(index, "x"))
                    .with_arg(OscArg::Float(cursor.position.x)),
            );
            bundle.push(
                OscMessage::new(mirror_address(index, "y"))
                    .with_arg(OscArg::Float(cursor.position.y)),
            );
            encode_packet(&OscPacket::Bundle(bundle))
        })
        .collect()
}
