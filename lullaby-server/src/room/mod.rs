mod relay_handle;
mod room;
mod room_command;
mod room_registry;
mod session_relay;

pub use relay_handle::*;
pub use room::*;
pub use room_command::*;
pub use room_registry::*;
pub use session_relay::*;
