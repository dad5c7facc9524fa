use crate::SessionError;
use lullaby_core::ClientMessage;
use tokio::sync::mpsc;

/// Outbound half of a participant's signaling connection.
///
/// Each session owns its own instance; nothing is shared globally.
pub trait SignalingTransport: Send + Sync {
    fn send(&self, msg: ClientMessage) -> Result<(), SessionError>;
}

/// Transport that queues outbound messages on an mpsc channel for whatever
/// task owns the real socket.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<ClientMessage>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SignalingTransport for ChannelTransport {
    fn send(&self, msg: ClientMessage) -> Result<(), SessionError> {
        self.tx
            .send(msg)
            .map_err(|_| SessionError::Transport("outbound channel closed".to_owned()))
    }
}
