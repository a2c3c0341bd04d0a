use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use asteroids::net::{FramedStream, Listener, SendStatus, bind_listener, connect};
use asteroids::{ClientConfig, GameClient, GameServer, Key, ServerConfig, ServerEvent};

static PORT_COUNTER: AtomicU16 = AtomicU16::new(40000);

const DT: f32 = 1.0 / 64.0;

fn next_addr() -> SocketAddr {
    let port = PORT_COUNTER.fetch_add(10, Ordering::SeqCst);
    format!("127.0.0.1:{}", port).parse().unwrap()
}

fn server_config(asteroids: usize) -> ServerConfig {
    ServerConfig {
        tick_rate: 64,
        sync_interval: 4.0 * DT,
        asteroid_count: asteroids,
        seed: Some(42),
        ..ServerConfig::default()
    }
}

fn client_config() -> ClientConfig {
    ClientConfig {
        tick_rate: 64,
        send_interval: 2.0 * DT,
        ..ClientConfig::default()
    }
}

/// Runs `step` until it reports completion or the timeout expires.
fn pump_until(timeout_ms: u64, mut step: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        if step() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

fn accept_one(listener: &mut std::net::TcpListener) -> TcpStream {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(2) {
        if let Some(stream) = Listener::accept(listener).unwrap() {
            return stream;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("no connection accepted");
}

#[test]
fn test_frames_survive_loopback() {
    let addr = next_addr();
    let mut listener = bind_listener(addr).unwrap();

    let sizes = [0usize, 1, 8192];
    let sender = thread::spawn(move || {
        let stream = TcpStream::connect(addr).unwrap();
        let mut framed = FramedStream::new(stream);
        for len in sizes {
            let payload: Vec<u8> = (0..len).map(|i| (i % 253) as u8).collect();
            assert_eq!(framed.send_frame(&payload).unwrap(), SendStatus::Sent);
        }
        // Hold the stream open until the receiver is done.
        thread::sleep(Duration::from_millis(500));
    });

    let mut receiver = FramedStream::new(accept_one(&mut listener));
    let mut received = Vec::new();
    let start = Instant::now();
    while received.len() < sizes.len() && start.elapsed() < Duration::from_secs(2) {
        match receiver.recv_frame().unwrap() {
            Some(payload) => received.push(payload.to_vec()),
            None => thread::sleep(Duration::from_millis(1)),
        }
    }

    assert_eq!(received.len(), sizes.len());
    for (payload, len) in received.iter().zip(sizes) {
        assert_eq!(payload.len(), len);
        assert!(payload.iter().enumerate().all(|(i, b)| *b == (i % 253) as u8));
    }
    sender.join().unwrap();
}

#[test]
fn test_first_snapshot_over_tcp() {
    let addr = next_addr();
    let mut server = GameServer::bind(addr, server_config(3)).unwrap();
    let mut client = GameClient::connect(addr, client_config()).unwrap();

    let synced = pump_until(2000, || {
        server.tick(DT);
        client.update(DT).unwrap();
        client.snapshots_received() > 0
    });
    assert!(synced, "client never received a snapshot");

    let state = client.state();
    assert_eq!(state.asteroid_count(), 3);
    assert_eq!(state.ship_count(), 1);
    assert!(client.local_ship().is_some());

    let events: Vec<_> = server.drain_events().collect();
    assert!(matches!(
        events.first(),
        Some(ServerEvent::ClientConnected { slot: 0, .. })
    ));
}

#[test]
fn test_local_flag_only_on_own_ship() {
    let addr = next_addr();
    let mut server = GameServer::bind(addr, server_config(3)).unwrap();
    let mut a = GameClient::connect(addr, client_config()).unwrap();

    assert!(pump_until(2000, || {
        server.tick(DT);
        a.update(DT).unwrap();
        a.snapshots_received() > 0
    }));

    let mut b = GameClient::connect(addr, client_config()).unwrap();
    let synced = pump_until(2000, || {
        server.tick(DT);
        a.update(DT).unwrap();
        b.update(DT).unwrap();
        a.state().ship_count() == 2 && b.state().ship_count() == 2
    });
    assert!(synced, "clients never saw each other");

    let local_slot = |state: &asteroids::GameState| state.local_ship().map(|(slot, _)| slot);
    assert_eq!(local_slot(a.state()), Some(0));
    assert_eq!(local_slot(b.state()), Some(1));
    for state in [a.state(), b.state()] {
        assert_eq!(state.ships().filter(|(_, ship)| ship.local).count(), 1);
        assert_eq!(state.asteroid_count(), 3);
    }
}

#[test]
fn test_input_reaches_server() {
    let addr = next_addr();
    let mut server = GameServer::bind(addr, server_config(0)).unwrap();
    let mut client = GameClient::connect(addr, client_config()).unwrap();
    client.set_key(Key::Up, true);
    client.set_key(Key::Right, true);

    let applied = pump_until(2000, || {
        server.tick(DT);
        client.update(DT).unwrap();
        server
            .client_infos()
            .first()
            .is_some_and(|info| info.input.accel == 1 && info.input.turn == 1)
    });
    assert!(applied, "server never applied the uploaded input");

    let advanced = pump_until(2000, || {
        server.tick(DT);
        server
            .state()
            .ships()
            .any(|(_, ship)| ship.velocity.length() > 0.0)
    });
    assert!(advanced);
}

#[test]
fn test_dropped_client_frees_slot() {
    let addr = next_addr();
    let mut server = GameServer::bind(addr, server_config(0)).unwrap();
    let stream = connect(addr).unwrap();

    assert!(pump_until(2000, || {
        server.tick(DT);
        server.state().ship_count() == 1
    }));

    drop(stream);
    let freed = pump_until(2000, || {
        server.tick(DT);
        server.state().ship_count() == 0
    });
    assert!(freed, "slot was not released after hangup");
}
