mod conn;
mod role;
mod room;
mod signaling;

pub use conn::ConnId;
pub use role::Role;
pub use room::RoomId;
pub use signaling::{ClientMessage, SdpType, ServerMessage, SessionDescription};
