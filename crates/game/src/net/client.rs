use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Instant;

use super::delta::{DeltaDecoder, DeltaError};
use super::protocol::{DEFAULT_SYNC_INTERVAL, DEFAULT_TICK_RATE, ProtocolError, encode_input};
use super::stats::NetworkStats;
use super::transport::{FrameError, FramedStream, Transport, connect};
use crate::simulation::{FixedTimestep, IntervalTimer, SimConfig, simulate};
use crate::world::{GameState, Input, Key, Ship};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub tick_rate: u32,
    /// Seconds between input frames.
    pub send_interval: f32,
    pub sim: SimConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            send_interval: DEFAULT_SYNC_INTERVAL,
            sim: SimConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connect(#[from] io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Delta(#[from] DeltaError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Predicting client: sends inputs, adopts server snapshots, and extrapolates between them.
pub struct GameClient<T> {
    stream: FramedStream<T>,
    decoder: DeltaDecoder,
    config: ClientConfig,
    state: GameState,
    input: Input,
    send_timer: IntervalTimer,
    timestep: FixedTimestep,
    connection: ConnectionState,
    snapshots_received: u64,
    last_update: Instant,
}

impl GameClient<TcpStream> {
    pub fn connect<A: ToSocketAddrs>(addr: A, config: ClientConfig) -> Result<Self, ClientError> {
        let stream = connect(addr)?;
        log::info!(
            "Connected to {}",
            stream
                .peer_addr()
                .map_or_else(|_| "<unknown>".to_string(), |addr| addr.to_string())
        );
        Self::new(stream, config)
    }
}

impl<T: Transport> GameClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            stream: FramedStream::new(transport),
            decoder: DeltaDecoder::new()?,
            state: GameState::new(),
            input: Input::default(),
            send_timer: IntervalTimer::new(config.send_interval),
            timestep: FixedTimestep::new(config.tick_rate),
            connection: ConnectionState::Connected,
            snapshots_received: 0,
            last_update: Instant::now(),
            config,
        })
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        self.input.set_key(key, pressed);
    }

    pub fn input(&self) -> Input {
        self.input
    }

    pub fn set_input(&mut self, input: Input) {
        self.input = input.normalized();
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn local_ship(&self) -> Option<&Ship> {
        self.state.local_ship().map(|(_, ship)| ship)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    pub fn snapshots_received(&self) -> u64 {
        self.snapshots_received
    }

    pub fn stats(&self) -> &NetworkStats {
        self.stream.stats()
    }

    /// Runs as many fixed ticks as wall-clock time since the last call allows.
    pub fn frame(&mut self) -> Result<u32, ClientError> {
        let now = Instant::now();
        let delta = now - self.last_update;
        self.last_update = now;
        self.timestep.accumulate(delta.as_secs_f32());

        let mut ticks_run = 0;
        while self.timestep.consume_tick() {
            self.update(self.timestep.dt())?;
            ticks_run += 1;
        }
        Ok(ticks_run)
    }

    /// One client tick. A transport or decode failure marks the connection lost; later
    /// calls are no-ops.
    pub fn update(&mut self, dt: f32) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Ok(());
        }

        if let Err(e) = self.sync(dt) {
            log::warn!("Lost connection to server: {}", e);
            self.connection = ConnectionState::Disconnected;
            return Err(e);
        }

        let input = self.input;
        simulate(&mut self.state, &self.config.sim, dt, |_, ship| {
            if ship.local { input } else { Input::default() }
        });
        Ok(())
    }

    fn sync(&mut self, dt: f32) -> Result<(), ClientError> {
        if self.send_timer.advance(dt) {
            let payload = encode_input(&self.input)?;
            self.stream.send_frame(&payload)?;
        }

        // Every diff advances the baseline; only the newest state is adopted.
        let mut latest = None;
        while let Some(payload) = self.stream.recv_frame()? {
            latest = Some(self.decoder.decode(payload)?);
            self.snapshots_received += 1;
        }
        if let Some(state) = latest {
            self.state.overwrite_from(&state);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::memory::{MemoryListener, MemoryStream};
    use crate::net::protocol::decode_input;
    use crate::net::server::{GameServer, ServerConfig};
    use crate::net::transport::SendStatus;

    const DT: f32 = 1.0 / 64.0;

    fn client_config() -> ClientConfig {
        ClientConfig {
            tick_rate: 64,
            send_interval: 2.0 * DT,
            ..ClientConfig::default()
        }
    }

    fn server_config(asteroids: usize) -> ServerConfig {
        ServerConfig {
            tick_rate: 64,
            sync_interval: 4.0 * DT,
            asteroid_count: asteroids,
            seed: Some(11),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_sends_input_on_interval() {
        let (client_end, server_end) = MemoryStream::pair();
        let mut client = GameClient::new(client_end, client_config()).unwrap();
        let mut server_side = FramedStream::new(server_end);
        client.set_key(Key::Up, true);
        client.set_key(Key::Fire, true);

        client.update(DT).unwrap();
        assert!(server_side.recv_frame().unwrap().is_none());

        client.update(DT).unwrap();
        let payload = server_side.recv_frame().unwrap().expect("input frame");
        let input = decode_input(payload).unwrap();
        assert_eq!(input.accel, 1);
        assert!(input.fire);
    }

    #[test]
    fn test_adopts_server_state() {
        let listener = MemoryListener::new();
        let mut server = GameServer::new(listener.clone(), server_config(3));
        let mut client = GameClient::new(listener.connect(), client_config()).unwrap();

        for _ in 0..4 {
            server.tick(DT);
        }
        client.update(DT).unwrap();

        assert_eq!(client.snapshots_received(), 1);
        assert_eq!(client.state().asteroid_count(), 3);
        assert_eq!(client.state().ship_count(), 1);
        assert!(client.local_ship().is_some());
    }

    #[test]
    fn test_predicts_only_local_ship() {
        let listener = MemoryListener::new();
        let mut server = GameServer::new(listener.clone(), server_config(0));
        let mut client = GameClient::new(listener.connect(), client_config()).unwrap();
        let _other = listener.connect();

        for _ in 0..4 {
            server.tick(DT);
        }
        client.update(DT).unwrap();
        client.set_key(Key::Up, true);
        for _ in 0..3 {
            client.update(DT).unwrap();
        }

        let local = client.local_ship().expect("local ship");
        assert!(local.velocity.y > 0.0);
        let other = client
            .state()
            .ships()
            .find(|(_, ship)| !ship.local)
            .map(|(_, ship)| *ship)
            .expect("remote ship");
        assert_eq!(other.velocity.length(), 0.0);
    }

    #[test]
    fn test_client_never_spawns_lasers() {
        let (client_end, _server_end) = MemoryStream::pair();
        let mut client = GameClient::new(client_end, client_config()).unwrap();
        client.set_key(Key::Fire, true);

        for _ in 0..32 {
            client.update(DT).unwrap();
        }
        assert_eq!(client.state().laser_count(), 0);
    }

    #[test]
    fn test_corrupt_snapshot_disconnects() {
        let (client_end, server_end) = MemoryStream::pair();
        let mut client = GameClient::new(client_end, client_config()).unwrap();
        let mut server_side = FramedStream::new(server_end);
        assert_eq!(
            server_side.send_frame(b"not zstd").unwrap(),
            SendStatus::Sent
        );

        assert!(matches!(client.update(DT), Err(ClientError::Delta(_))));
        assert!(!client.is_connected());
        assert!(client.update(DT).is_ok());
    }

    #[test]
    fn test_input_send_failure_disconnects() {
        let (client_end, _server_end) = MemoryStream::pair();
        client_end.set_write_budget(Some(1));
        let mut client = GameClient::new(client_end, client_config()).unwrap();

        client.update(DT).unwrap();
        assert!(matches!(
            client.update(DT),
            Err(ClientError::Frame(FrameError::ShortWrite { written: 1, .. }))
        ));
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_server_hangup_disconnects() {
        let (client_end, server_end) = MemoryStream::pair();
        let mut client = GameClient::new(client_end, client_config()).unwrap();
        server_end.close();

        assert!(matches!(
            client.update(DT),
            Err(ClientError::Frame(FrameError::Closed))
        ));
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }
}
