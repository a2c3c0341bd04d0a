mod client;
mod delta;
mod events;
#[cfg(test)]
mod memory;
mod protocol;
mod server;
mod snapshot;
mod stats;
mod transport;

pub use client::{ClientConfig, ClientError, ConnectionState, GameClient};
pub use delta::{DEFAULT_COMPRESSION_LEVEL, DeltaDecoder, DeltaEncoder, DeltaError, xor, xor_into};
pub use events::{DisconnectReason, ServerEvent};
pub use protocol::{
    DEFAULT_PORT, DEFAULT_SYNC_INTERVAL, DEFAULT_TICK_RATE, INPUT_PAYLOAD_SIZE,
    LENGTH_PREFIX_SIZE, MAX_FRAME_PAYLOAD, ProtocolError, decode_input, encode_input,
};
pub use server::{ClientInfo, GameServer, ServerConfig, ServerStats};
pub use snapshot::{
    ASTEROID_RECORD_SIZE, LASER_RECORD_SIZE, SHIP_RECORD_SIZE, SNAPSHOT_SIZE, SlotFlags,
    SlotKind, SnapshotError, decode_snapshot, encode_snapshot,
};
pub use stats::NetworkStats;
pub use transport::{
    FrameError, FramedStream, Listener, SendStatus, Transport, bind_listener, connect,
};
