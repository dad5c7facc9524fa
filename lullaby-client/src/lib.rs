mod error;
mod media;
mod peer;
mod publisher;
mod session;
mod transport;
mod viewer;

pub use error::*;
pub use media::*;
pub use peer::*;
pub use publisher::*;
pub use session::*;
pub use transport::*;
pub use viewer::*;
