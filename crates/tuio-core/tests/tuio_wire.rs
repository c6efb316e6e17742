//! Integration tests for the tuio-core wire format.
//!
//! These tests drive the public API the way the gateway does: route a
//! snapshot through a partition, encode one bundle, decode it on the far side
//! and feed it to a frame tracker.

use tuio_core::{
    decode_frame, encode_cursor_bundle,
    protocol::{
        osc::{encode_packet, OscArg, OscBundle, OscMessage, OscPacket},
        tuio::CURSOR_2D_PROFILE,
    },
    CursorEvent, CursorSession, DisplayPartition, FrameSequence, FrameTracker, SessionTable,
    TuioError, Vec2,
};

fn cursor(id: i32, x: f32, y: f32) -> CursorSession {
    CursorSession::at(id, Vec2::new(x, y))
}

/// Applies every event to the table, as the relay engine does.
fn apply_all(table: &mut SessionTable, events: Vec<CursorEvent>) {
    for event in events {
        table.apply(event);
    }
}

#[test]
fn test_routed_bundle_round_trips_into_receiver_table() {
    // Arrange
    let partition = DisplayPartition::new(2, 1);
    let snapshot = vec![cursor(1, 0.3, 0.5), cursor(2, 0.9, 0.0)];
    let routed = partition.route(&snapshot);
    let bytes = encode_cursor_bundle(&routed, 1).expect("encode must succeed");

    // Act
    let frame = decode_frame(&bytes).expect("decode must succeed");
    let mut tracker = FrameTracker::new();
    let mut table = SessionTable::new();
    apply_all(&mut table, tracker.process(frame, "127.0.0.1:3333"));

    // Assert – id 2 has y == 0 and never leaves the sender
    assert_eq!(table.len(), 1);
    let received = table.get(1).expect("id 1 must arrive");
    assert!((received.position.x - 0.15).abs() < 1e-6);
    assert!((received.position.y - 0.5).abs() < 1e-6);
}

#[test]
fn test_empty_snapshot_still_yields_alive_and_fseq() {
    let bytes = encode_cursor_bundle(&[], 7).expect("encode must succeed");

    let frame = decode_frame(&bytes).expect("decode must succeed");

    assert!(frame.sets.is_empty());
    assert_eq!(frame.alive, Some(vec![]));
    assert_eq!(frame.fseq, Some(7));
    assert_eq!(frame.source, None);
}

#[test]
fn test_consecutive_cycles_drive_add_update_remove() {
    // Arrange
    let fseq = FrameSequence::new();
    let mut tracker = FrameTracker::new();
    let mut table = SessionTable::new();
    let cycles: Vec<Vec<CursorSession>> = vec![
        vec![cursor(3, 0.2, 0.2)],
        vec![cursor(3, 0.4, 0.4), cursor(4, 0.6, 0.6)],
        vec![cursor(4, 0.7, 0.7)],
    ];

    // Act
    for snapshot in &cycles {
        let bytes = encode_cursor_bundle(snapshot, fseq.next()).expect("encode");
        let frame = decode_frame(&bytes).expect("decode");
        apply_all(&mut table, tracker.process(frame, "peer"));
    }

    // Assert
    assert!(!table.contains(3), "3 left the alive list and must be removed");
    let four = table.get(4).expect("4 must still be live");
    assert!((four.position.x - 0.7).abs() < 1e-6);
}

#[test]
fn test_reordered_datagram_does_not_resurrect_cursor() {
    // Arrange
    let mut tracker = FrameTracker::new();
    let mut table = SessionTable::new();
    let old = encode_cursor_bundle(&[cursor(1, 0.5, 0.5)], 1).expect("encode");
    let new = encode_cursor_bundle(&[], 2).expect("encode");

    // Act – frame 2 overtakes frame 1 on the wire
    apply_all(&mut table, tracker.process(decode_frame(&new).expect("decode"), "p"));
    apply_all(&mut table, tracker.process(decode_frame(&old).expect("decode"), "p"));

    // Assert
    assert!(table.is_empty());
}

#[test]
fn test_foreign_profile_datagram_is_rejected() {
    // Arrange
    let mut bundle = OscBundle::immediate();
    bundle.push(
        OscMessage::new("/tuio/2Dobj")
            .with_arg(OscArg::Str("alive".into()))
            .with_arg(OscArg::Int(1)),
    );
    let bytes = encode_packet(&OscPacket::Bundle(bundle)).expect("encode");

    // Act
    let result = decode_frame(&bytes);

    // Assert
    assert_eq!(
        result,
        Err(TuioError::UnsupportedProfile("/tuio/2Dobj".into()))
    );
}

#[test]
fn test_mixed_profile_bundle_keeps_only_cursor_messages() {
    // Arrange
    let mut bundle = OscBundle::immediate();
    bundle.push(
        OscMessage::new("/tuio/2Dblb")
            .with_arg(OscArg::Str("alive".into()))
            .with_arg(OscArg::Int(9)),
    );
    bundle.push(
        OscMessage::new(CURSOR_2D_PROFILE)
            .with_arg(OscArg::Str("alive".into()))
            .with_arg(OscArg::Int(2)),
    );
    bundle.push(
        OscMessage::new(CURSOR_2D_PROFILE)
            .with_arg(OscArg::Str("fseq".into()))
            .with_arg(OscArg::Int(11)),
    );
    let bytes = encode_packet(&OscPacket::Bundle(bundle)).expect("encode");

    // Act
    let frame = decode_frame(&bytes).expect("2Dcur content must decode");

    // Assert
    assert_eq!(frame.alive, Some(vec![2]));
    assert_eq!(frame.fseq, Some(11));
}

#[test]
fn test_truncated_datagram_is_an_error_not_a_panic() {
    let bytes = encode_cursor_bundle(&[cursor(1, 0.5, 0.5)], 1).expect("encode");

    for cut in [0, 3, 8, 15, 20, bytes.len() - 1] {
        assert!(
            decode_frame(&bytes[..cut]).is_err(),
            "prefix of {cut} bytes must not decode"
        );
    }
}

#[test]
fn test_partitions_split_surface_without_overlap() {
    // Arrange
    let snapshot: Vec<CursorSession> = (1..20)
        .map(|i| cursor(i, i as f32 / 20.0, 0.5))
        .collect();

    // Act
    let per_tile: Vec<Vec<CursorSession>> = (1..=4)
        .map(|tile| DisplayPartition::new(4, tile).route(&snapshot))
        .collect();

    // Assert – each tile compresses the surface into its own slice
    for (i, routed) in per_tile.iter().enumerate() {
        let p = DisplayPartition::new(4, i as i32 + 1);
        assert!(routed
            .iter()
            .all(|c| c.position.x > p.cell_start() && c.position.x < p.cell_end()));
    }
}
