use crate::room::RegistryStats;
use lullaby_core::{ConnId, Role, RoomId, SessionDescription};
use tokio::sync::oneshot;

/// Commands fed into the session relay by the signaling layer.
#[derive(Debug)]
pub enum RelayCommand {
    /// A connection asked to join a room in the given role.
    Join {
        conn: ConnId,
        room: RoomId,
        role: Role,
    },

    /// A session description to route inside a room.
    Signal {
        conn: ConnId,
        to: Option<ConnId>,
        room: RoomId,
        data: SessionDescription,
    },

    /// Explicit leave of one room.
    Leave { conn: ConnId, room: RoomId },

    /// The WebSocket closed: drop the connection from every room.
    Disconnect { conn: ConnId },

    Stats {
        reply: oneshot::Sender<RegistryStats>,
    },
}
