mod config;
mod error;
mod room;
mod router;
mod signaling;

pub use config::*;
pub use error::*;
pub use room::*;
pub use router::*;
pub use signaling::*;
