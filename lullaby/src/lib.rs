pub use lullaby_core::model::{ConnId, Role, RoomId};

pub mod model {
    pub use lullaby_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use lullaby_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use lullaby_client::*;
}
