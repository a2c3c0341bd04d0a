pub mod net;
pub mod simulation;
pub mod world;

pub use net::{
    ClientConfig, ConnectionState, DEFAULT_PORT, DEFAULT_SYNC_INTERVAL, DEFAULT_TICK_RATE,
    GameClient, GameServer, NetworkStats, ServerConfig, ServerEvent,
};
pub use simulation::{FixedTimestep, IntervalTimer, SimConfig, parse_interval};
pub use world::{Asteroid, GameState, Input, Key, Laser, Ship, ShipId};
