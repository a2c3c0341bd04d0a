use std::net::SocketAddr;

use crate::world::ShipId;

#[derive(Debug, Clone)]
pub enum ServerEvent {
    ClientConnected {
        slot: usize,
        ship_id: ShipId,
        addr: Option<SocketAddr>,
    },
    ClientDisconnected {
        slot: usize,
        ship_id: ShipId,
        reason: DisconnectReason,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Peer closed the stream.
    Closed,
    /// Hard transport failure or a malformed frame.
    Transport(String),
    Protocol(String),
    /// Dropped by the operator.
    Kicked,
    Shutdown,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &str {
        match self {
            DisconnectReason::Closed => "disconnected",
            DisconnectReason::Transport(message) => message,
            DisconnectReason::Protocol(message) => message,
            DisconnectReason::Kicked => "kicked",
            DisconnectReason::Shutdown => "server shutdown",
        }
    }

    /// True for hangups nobody needs to be warned about.
    pub fn is_orderly(&self) -> bool {
        matches!(
            self,
            DisconnectReason::Closed | DisconnectReason::Kicked | DisconnectReason::Shutdown
        )
    }
}
