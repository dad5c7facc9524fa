use async_trait::async_trait;
use lullaby_core::{ConnId, ServerMessage};

/// Implemented by whatever owns the client connections (the WebSocket layer
/// in production, a recorder in tests) so the relay can reach participants.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Deliver one message to one connection. Unknown connections are the
    /// implementor's problem to log; delivery never fails the relay.
    async fn deliver(&self, to: ConnId, message: ServerMessage);
}
