use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::delta::{DEFAULT_COMPRESSION_LEVEL, DeltaEncoder};
use super::events::{DisconnectReason, ServerEvent};
use super::protocol::{DEFAULT_SYNC_INTERVAL, DEFAULT_TICK_RATE, decode_input};
use super::snapshot::{SNAPSHOT_SIZE, encode_snapshot};
use super::stats::NetworkStats;
use super::transport::{FrameError, FramedStream, Listener, SendStatus, Transport, bind_listener};
use crate::simulation::{FireControl, FixedTimestep, IntervalTimer, SimConfig, simulate};
use crate::world::{GameState, Input, MAX_SHIPS, ShipId};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_rate: u32,
    /// Seconds between snapshot dispatches.
    pub sync_interval: f32,
    pub asteroid_count: usize,
    pub compression_level: i32,
    /// Fixed RNG seed for asteroid spawns; entropy when `None`.
    pub seed: Option<u64>,
    pub sim: SimConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            asteroid_count: 8,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            seed: None,
            sim: SimConfig::default(),
        }
    }
}

impl From<FrameError> for DisconnectReason {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Closed => DisconnectReason::Closed,
            other => DisconnectReason::Transport(other.to_string()),
        }
    }
}

struct Player<S> {
    stream: FramedStream<S>,
    ship_id: ShipId,
    input: Input,
    fire: FireControl,
    encoder: DeltaEncoder,
    addr: Option<SocketAddr>,
    connected_at: Instant,
    inputs_received: u64,
    snapshots_sent: u64,
    last_snapshot_bytes: usize,
}

impl<S: Transport> Player<S> {
    fn new(stream: S, ship_id: ShipId, encoder: DeltaEncoder) -> Self {
        let stream = FramedStream::new(stream);
        Self {
            addr: stream.peer_addr(),
            stream,
            ship_id,
            input: Input::default(),
            fire: FireControl::default(),
            encoder,
            connected_at: Instant::now(),
            inputs_received: 0,
            snapshots_sent: 0,
            last_snapshot_bytes: 0,
        }
    }

    /// Reads every fully arrived input frame; the last one wins.
    fn drain_inputs(&mut self) -> Result<(), DisconnectReason> {
        while let Some(payload) = self.stream.recv_frame()? {
            let input =
                decode_input(payload).map_err(|e| DisconnectReason::Protocol(e.to_string()))?;
            self.input = input;
            self.inputs_received += 1;
        }
        Ok(())
    }

    /// Sends the diff of `current` against this player's baseline. The baseline only moves
    /// once the frame is on the wire, so a deferred send is diffed again next time.
    fn send_snapshot(&mut self, current: &[u8]) -> Result<Option<usize>, DisconnectReason> {
        let payload = self
            .encoder
            .encode(current)
            .map_err(|e| DisconnectReason::Protocol(e.to_string()))?;

        match self.stream.send_frame(&payload)? {
            SendStatus::Sent => {
                self.encoder
                    .commit(current)
                    .map_err(|e| DisconnectReason::Protocol(e.to_string()))?;
                self.snapshots_sent += 1;
                self.last_snapshot_bytes = payload.len();
                Ok(Some(payload.len()))
            }
            SendStatus::WouldBlock => Ok(None),
        }
    }
}

enum PlayerSlot<S> {
    Empty,
    Connected(Box<Player<S>>),
    Disconnected(Box<Player<S>>, DisconnectReason),
}

impl<S> PlayerSlot<S> {
    fn mark_disconnected(&mut self, reason: DisconnectReason) {
        *self = match std::mem::replace(self, PlayerSlot::Empty) {
            PlayerSlot::Connected(player) => PlayerSlot::Disconnected(player, reason),
            other => other,
        };
    }

    fn is_empty(&self) -> bool {
        matches!(self, PlayerSlot::Empty)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    pub tick: u64,
    pub tick_rate: u32,
    pub uptime_secs: u64,
    pub client_count: usize,
    pub max_clients: usize,
    pub ship_count: usize,
    pub asteroid_count: usize,
    pub laser_count: usize,
    pub snapshots_sent: u64,
    pub last_snapshot_bytes: usize,
    pub inputs_received: u64,
    pub snapshot_bytes_raw: u64,
    pub snapshot_bytes_compressed: u64,
    pub network_stats: NetworkStats,
}

impl ServerStats {
    pub fn compression_ratio(&self) -> f64 {
        if self.snapshot_bytes_compressed == 0 {
            return 0.0;
        }
        self.snapshot_bytes_raw as f64 / self.snapshot_bytes_compressed as f64
    }
}

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub slot: usize,
    pub ship_id: ShipId,
    pub addr: Option<SocketAddr>,
    pub connected_secs: u64,
    pub input: Input,
    pub inputs_received: u64,
    pub snapshots_sent: u64,
    pub last_snapshot_bytes: usize,
    pub network_stats: NetworkStats,
}

/// Authoritative session loop. One ship slot per connection; slot index is shared with the
/// ship arena so a player's slot is also its wire identity.
pub struct GameServer<L: Listener> {
    listener: L,
    config: ServerConfig,
    state: GameState,
    slots: Vec<PlayerSlot<L::Stream>>,
    timestep: FixedTimestep,
    sync_timer: IntervalTimer,
    rng: StdRng,
    tick: u64,
    snapshots_sent: u64,
    snapshot_bytes_compressed: u64,
    last_snapshot_bytes: usize,
    inputs_received: u64,
    retired_stats: NetworkStats,
    running: Arc<AtomicBool>,
    last_update: Instant,
    start_time: Instant,
    pending_events: VecDeque<ServerEvent>,
}

impl GameServer<TcpListener> {
    pub fn bind<A: ToSocketAddrs>(addr: A, config: ServerConfig) -> io::Result<Self> {
        let listener = bind_listener(addr)?;
        Ok(Self::new(listener, config))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl<L: Listener> GameServer<L> {
    pub fn new(listener: L, config: ServerConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut state = GameState::new();
        for _ in 0..config.asteroid_count {
            if state.add_asteroid(&mut rng, config.sim.extents).is_none() {
                log::warn!("Asteroid pool full, spawned {}", state.asteroid_count());
                break;
            }
        }

        Self {
            listener,
            state,
            slots: (0..MAX_SHIPS).map(|_| PlayerSlot::Empty).collect(),
            timestep: FixedTimestep::new(config.tick_rate),
            sync_timer: IntervalTimer::new(config.sync_interval),
            rng,
            tick: 0,
            snapshots_sent: 0,
            snapshot_bytes_compressed: 0,
            last_snapshot_bytes: 0,
            inputs_received: 0,
            retired_stats: NetworkStats::default(),
            running: Arc::new(AtomicBool::new(true)),
            last_update: Instant::now(),
            start_time: Instant::now(),
            pending_events: VecDeque::new(),
            config,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn spawn_asteroid(&mut self) -> Option<usize> {
        self.state.add_asteroid(&mut self.rng, self.config.sim.extents)
    }

    pub fn run(&mut self) {
        self.timestep.reset();
        self.last_update = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            self.update();
            std::thread::sleep(Duration::from_secs_f32(self.timestep.remaining()));
        }
        self.shutdown_connections();
    }

    /// Runs as many fixed ticks as wall-clock time since the last call allows.
    pub fn update(&mut self) -> u32 {
        let now = Instant::now();
        let delta = now - self.last_update;
        self.last_update = now;
        self.timestep.accumulate(delta.as_secs_f32());

        let mut ticks_run = 0;
        while self.timestep.consume_tick() {
            self.tick(self.timestep.dt());
            ticks_run += 1;
        }
        ticks_run
    }

    /// One server tick: accept, ingest inputs, free dropped slots, simulate, then sync.
    pub fn tick(&mut self, dt: f32) {
        self.accept_connections();
        self.ingest_inputs();
        self.reap_disconnected();

        let slots = &self.slots;
        simulate(&mut self.state, &self.config.sim, dt, |slot, _| match &slots[slot] {
            PlayerSlot::Connected(player) => player.input,
            _ => Input::default(),
        });
        self.fire_lasers(dt);

        if self.sync_timer.advance(dt) {
            self.broadcast_snapshots();
        }

        self.tick += 1;
    }

    fn accept_connections(&mut self) {
        for index in 0..self.slots.len() {
            if !self.slots[index].is_empty() {
                continue;
            }

            match self.listener.accept() {
                Ok(Some(stream)) => self.admit(stream),
                Ok(None) => break,
                Err(e) => {
                    log::error!("Accept failed: {}", e);
                    self.pending_events.push_back(ServerEvent::Error {
                        message: format!("Accept failed: {}", e),
                    });
                    break;
                }
            }
        }
    }

    fn admit(&mut self, stream: L::Stream) {
        let encoder = match DeltaEncoder::new(self.config.compression_level) {
            Ok(encoder) => encoder,
            Err(e) => {
                log::error!("Could not create snapshot encoder: {}", e);
                self.pending_events.push_back(ServerEvent::Error {
                    message: format!("Could not create snapshot encoder: {}", e),
                });
                return;
            }
        };

        let Some((slot, ship_id)) = self.state.add_ship() else {
            log::warn!("No free ship slot, dropping connection");
            return;
        };

        let player = Player::new(stream, ship_id, encoder);
        let addr = player.addr;
        self.slots[slot] = PlayerSlot::Connected(Box::new(player));

        log::info!(
            "Client {} connected in slot {} (ship {})",
            format_addr(addr),
            slot,
            ship_id
        );
        self.pending_events.push_back(ServerEvent::ClientConnected {
            slot,
            ship_id,
            addr,
        });
    }

    fn ingest_inputs(&mut self) {
        for slot in &mut self.slots {
            let PlayerSlot::Connected(player) = slot else {
                continue;
            };
            let before = player.inputs_received;
            let result = player.drain_inputs();
            self.inputs_received += player.inputs_received - before;
            if let Err(reason) = result {
                slot.mark_disconnected(reason);
            }
        }
    }

    fn reap_disconnected(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !matches!(slot, PlayerSlot::Disconnected(..)) {
                continue;
            }
            let PlayerSlot::Disconnected(player, reason) = std::mem::replace(slot, PlayerSlot::Empty)
            else {
                continue;
            };

            self.state.remove_ship(player.ship_id);
            self.retired_stats.merge(player.stream.stats());

            if reason.is_orderly() {
                log::info!(
                    "Client in slot {} (ship {}) {}",
                    index,
                    player.ship_id,
                    reason.as_str()
                );
            } else {
                log::warn!(
                    "Dropping client in slot {} (ship {}): {}",
                    index,
                    player.ship_id,
                    reason.as_str()
                );
            }
            self.pending_events
                .push_back(ServerEvent::ClientDisconnected {
                    slot: index,
                    ship_id: player.ship_id,
                    reason,
                });
        }
    }

    fn fire_lasers(&mut self, dt: f32) {
        let interval = self.config.sim.ship_fire_interval;
        let lifetime = self.config.sim.laser_lifetime;

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let PlayerSlot::Connected(player) = slot else {
                continue;
            };
            if !player.fire.update(player.input.fire, interval, dt) {
                continue;
            }

            let Some(ship) = self.state.ships[index].filter(|ship| ship.id == player.ship_id)
            else {
                continue;
            };
            if self
                .state
                .add_laser(ship.position, ship.rotation, lifetime)
                .is_none()
            {
                log::trace!("Laser pool full, shot from ship {} dropped", ship.id);
            }
        }
    }

    fn broadcast_snapshots(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let PlayerSlot::Connected(player) = slot else {
                continue;
            };

            let current = encode_snapshot(&self.state, Some(index));
            match player.send_snapshot(&current) {
                Ok(Some(bytes)) => {
                    self.snapshots_sent += 1;
                    self.snapshot_bytes_compressed += bytes as u64;
                    self.last_snapshot_bytes = bytes;
                    log::debug!(
                        "Snapshot to slot {}: {} -> {} bytes",
                        index,
                        SNAPSHOT_SIZE,
                        bytes
                    );
                }
                Ok(None) => log::debug!("Snapshot to slot {} deferred", index),
                Err(reason) => slot.mark_disconnected(reason),
            }
        }
    }

    /// Drops the connection in `slot`; the ship is freed on the next tick.
    pub fn kick(&mut self, slot: usize) {
        if let Some(player_slot) = self.slots.get_mut(slot) {
            player_slot.mark_disconnected(DisconnectReason::Kicked);
        }
    }

    pub fn shutdown_connections(&mut self) {
        for slot in &mut self.slots {
            slot.mark_disconnected(DisconnectReason::Shutdown);
        }
        self.reap_disconnected();
    }

    pub fn stats(&self) -> ServerStats {
        let mut network_stats = self.retired_stats.clone();
        let mut client_count = 0;
        for slot in &self.slots {
            if let PlayerSlot::Connected(player) = slot {
                network_stats.merge(player.stream.stats());
                client_count += 1;
            }
        }

        ServerStats {
            tick: self.tick,
            tick_rate: self.timestep.tick_rate(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            client_count,
            max_clients: MAX_SHIPS,
            ship_count: self.state.ship_count(),
            asteroid_count: self.state.asteroid_count(),
            laser_count: self.state.laser_count(),
            snapshots_sent: self.snapshots_sent,
            last_snapshot_bytes: self.last_snapshot_bytes,
            inputs_received: self.inputs_received,
            snapshot_bytes_raw: self.snapshots_sent * SNAPSHOT_SIZE as u64,
            snapshot_bytes_compressed: self.snapshot_bytes_compressed,
            network_stats,
        }
    }

    pub fn client_infos(&self) -> Vec<ClientInfo> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, player_slot)| match player_slot {
                PlayerSlot::Connected(player) => Some(ClientInfo {
                    slot,
                    ship_id: player.ship_id,
                    addr: player.addr,
                    connected_secs: player.connected_at.elapsed().as_secs(),
                    input: player.input,
                    inputs_received: player.inputs_received,
                    snapshots_sent: player.snapshots_sent,
                    last_snapshot_bytes: player.last_snapshot_bytes,
                    network_stats: player.stream.stats().clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

fn format_addr(addr: Option<SocketAddr>) -> String {
    addr.map_or_else(|| "<unknown>".to_string(), |addr| addr.to_string())
}
