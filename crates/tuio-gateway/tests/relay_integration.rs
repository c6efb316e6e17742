//! Integration tests for the relay pipeline over real loopback sockets.
//!
//! These tests exercise the gateway end-to-end: inbound listener, operation
//! queue, relay engine, partition routing and the outbound transmitter.

use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use tuio_core::{
    decode_frame, encode_cursor_bundle, CursorSession, Mode, RelayState, TuioFrame, Vec2,
    LOCAL_POINTER_SESSION,
};
use tuio_gateway::infrastructure::gateway::Gateway;
use tuio_gateway::infrastructure::storage::config::GatewayConfig;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A raw UDP socket standing in for the downstream receiver.
fn sink() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("sink bind");
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .expect("sink timeout");
    let port = socket.local_addr().expect("sink addr").port();
    (socket, port)
}

fn config(mode: Mode, remote_port: u16) -> GatewayConfig {
    let mut cfg = GatewayConfig::default();
    cfg.gateway.mode = mode.index();
    cfg.network.local_tuio_port = 0;
    cfg.network.remote_ip = "127.0.0.1".to_string();
    cfg.network.remote_tuio_port = remote_port;
    cfg
}

/// Loopback address of the gateway's inbound listener.
fn inbound_of(gateway: &Gateway) -> SocketAddr {
    let port = gateway
        .controller()
        .inbound_addr()
        .expect("listener bound")
        .port();
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn recv_frame(socket: &UdpSocket) -> TuioFrame {
    let mut buf = [0u8; 4096];
    let (len, _) = socket.recv_from(&mut buf).expect("datagram from gateway");
    decode_frame(&buf[..len]).expect("valid TUIO bundle")
}

/// Ticks `gateway` until `done` holds or two seconds pass.
async fn tick_until(gateway: &mut Gateway, done: impl Fn(&Gateway) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        gateway.tick().await;
        if done(gateway) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_router_forwards_only_cursors_on_target_tile() {
    // Arrange – two tiles, forward the left one
    let (downstream, port) = sink();
    let mut cfg = config(Mode::Router, port);
    cfg.display.n_displays = 2;
    cfg.display.remote_display_id = 1;
    let mut gateway = Gateway::new(cfg, None);
    assert_eq!(gateway.connect(), RelayState::Routing);

    let upstream = UdpSocket::bind("127.0.0.1:0").expect("upstream bind");
    let cursors = vec![
        CursorSession::at(1, Vec2::new(0.4, 0.5)),
        CursorSession::at(2, Vec2::new(0.5, 0.5)),
        CursorSession::at(3, Vec2::new(0.9, 0.0)),
    ];
    let datagram = encode_cursor_bundle(&cursors, 1).expect("encode");

    // Act
    upstream
        .send_to(&datagram, inbound_of(&gateway))
        .expect("send upstream");
    let arrived = tick_until(&mut gateway, |g| g.table().len() == 3).await;

    // Assert
    assert!(arrived, "all three cursors must reach the table");
    gateway.tick().await;
    // Earlier cycles may have sent before every cursor was drained.
    let frame = loop {
        let frame = recv_frame(&downstream);
        let alive = frame.alive.as_deref().unwrap_or_default();
        assert!(!alive.contains(&3), "id 3 must never be forwarded");
        if alive.len() == 2 {
            break frame;
        }
    };
    let mut alive = frame.alive.expect("alive");
    alive.sort_unstable();
    assert_eq!(alive, vec![1, 2], "id 3 sits on y == 0 and is filtered");
    let first = frame.sets.iter().find(|s| s.session_id == 1).expect("set 1");
    assert!((first.position.x - 0.2).abs() < 1e-6, "x remapped into [0, 0.5)");
    gateway.shutdown();
}

#[tokio::test]
async fn test_sender_emits_monotonic_fseq_with_complete_alive() {
    // Arrange
    let (downstream, port) = sink();
    let mut gateway = Gateway::new(config(Mode::Sender, port), None);
    gateway.connect();
    gateway.input().pointer_down(0.25, 0.5, 1.0, 1.0);

    // Act
    for _ in 0..5 {
        gateway.tick().await;
    }

    // Assert
    let frames: Vec<TuioFrame> = (0..5).map(|_| recv_frame(&downstream)).collect();
    let fseqs: Vec<i32> = frames.iter().map(|f| f.fseq.expect("fseq")).collect();
    assert_eq!(fseqs, vec![1, 2, 3, 4, 5]);
    for frame in &frames {
        assert_eq!(frame.alive, Some(vec![LOCAL_POINTER_SESSION]));
        assert_eq!(frame.sets.len(), 1);
    }
    gateway.shutdown();
}

#[tokio::test]
async fn test_local_pointer_release_empties_alive() {
    // Arrange
    let (downstream, port) = sink();
    let mut gateway = Gateway::new(config(Mode::Sender, port), None);
    gateway.connect();
    gateway.input().pointer_down(0.5, 0.5, 1.0, 1.0);
    gateway.tick().await;

    // Act
    gateway.input().pointer_up();
    gateway.tick().await;

    // Assert
    let pressed = recv_frame(&downstream);
    let released = recv_frame(&downstream);
    assert_eq!(pressed.alive, Some(vec![LOCAL_POINTER_SESSION]));
    assert_eq!(released.alive, Some(vec![]));
    assert!(released.sets.is_empty());
    gateway.shutdown();
}

#[tokio::test]
async fn test_chained_gateways_relay_the_local_pointer() {
    // Arrange – B receives, A sends to B
    let mut receiver = Gateway::new(config(Mode::Receiver, 0), None);
    assert_eq!(receiver.connect(), RelayState::Receiving);
    let b_port = inbound_of(&receiver).port();

    let mut sender = Gateway::new(config(Mode::Sender, b_port), None);
    sender.connect();
    sender.input().pointer_down(0.75, 0.25, 1.0, 1.0);

    // Act
    sender.tick().await;
    let arrived = tick_until(&mut receiver, |g| g.table().contains(LOCAL_POINTER_SESSION)).await;

    // Assert
    assert!(arrived, "the relayed cursor must reach the receiver's table");
    let cursor = receiver
        .table()
        .get(LOCAL_POINTER_SESSION)
        .expect("relayed cursor");
    assert!((cursor.position.x - 0.75).abs() < 1e-6);
    assert!((cursor.position.y - 0.25).abs() < 1e-6);

    sender.shutdown();
    receiver.shutdown();
}

#[tokio::test]
async fn test_removed_upstream_cursor_leaves_the_table() {
    // Arrange
    let mut gateway = Gateway::new(config(Mode::Receiver, 0), None);
    gateway.connect();
    let upstream = UdpSocket::bind("127.0.0.1:0").expect("upstream bind");
    let target = inbound_of(&gateway);
    let first = encode_cursor_bundle(&[CursorSession::at(7, Vec2::new(0.5, 0.5))], 10)
        .expect("encode");
    upstream.send_to(&first, target).expect("send");
    assert!(tick_until(&mut gateway, |g| g.table().contains(7)).await);

    // Act
    let empty = encode_cursor_bundle(&[], 11).expect("encode");
    upstream.send_to(&empty, target).expect("send");
    let removed = tick_until(&mut gateway, |g| g.table().is_empty()).await;

    // Assert
    assert!(removed, "an id missing from alive must be removed");
    gateway.shutdown();
}

#[tokio::test]
async fn test_rebind_after_port_is_released() {
    // Arrange
    let holder = UdpSocket::bind("0.0.0.0:0").expect("holder bind");
    let port = holder.local_addr().expect("addr").port();
    let mut cfg = config(Mode::Receiver, 0);
    cfg.network.local_tuio_port = port;
    let mut gateway = Gateway::new(cfg, None);
    assert_eq!(gateway.connect(), RelayState::Idle);
    assert!(gateway.status_line().contains("[FAIL]"));

    // Act
    drop(holder);
    let state = gateway.connect();

    // Assert
    assert_eq!(state, RelayState::Receiving);
    assert!(!gateway.status_line().contains("[FAIL]"));
    gateway.shutdown();
}
