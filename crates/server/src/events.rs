use std::net::SocketAddr;

use mocap::PacketCode;

#[derive(Debug, Clone)]
pub enum ServerEvent {
    ClientConnected {
        addr: SocketAddr,
    },
    ClientDisconnected {
        addr: SocketAddr,
        reason: DisconnectReason,
    },
    BadPacket {
        addr: SocketAddr,
        reason: String,
    },
    Unhandled {
        addr: SocketAddr,
        code: PacketCode,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Graceful,
    Timeout,
    Kicked,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Graceful => "disconnected",
            DisconnectReason::Timeout => "lost connection",
            DisconnectReason::Kicked => "kicked",
        }
    }
}
