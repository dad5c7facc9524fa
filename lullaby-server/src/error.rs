use lullaby_core::{ConnId, RoomId};
use thiserror::Error;

/// Reasons the relay refuses to act on a command.
///
/// None of these are fatal: the relay logs them and drops the command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("room '{0}' does not exist")]
    UnknownRoom(RoomId),

    #[error("target {target} is not a member of room '{room}'")]
    UnknownTarget { room: RoomId, target: ConnId },

    #[error("connection {conn} is not a member of room '{room}'")]
    NotAMember { room: RoomId, conn: ConnId },

    #[error("room id rejected: {0}")]
    RejectedRoomId(String),

    #[error("session relay is no longer running")]
    RelayClosed,
}
