use crate::{PeerEvent, PeerTag};
use lullaby_core::ServerMessage;
use tokio::sync::mpsc;
use tracing::info;

/// Everything a client session reacts to, funnelled through one channel.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Server(ServerMessage),
    Peer { tag: PeerTag, event: PeerEvent },
    /// The signaling connection dropped.
    TransportClosed,
    /// The host wants the session wound down (leave/teardown).
    Shutdown,
}

pub fn session_channel() -> (
    mpsc::UnboundedSender<SessionEvent>,
    mpsc::UnboundedReceiver<SessionEvent>,
) {
    mpsc::unbounded_channel()
}

/// A client-side connection state machine.
pub trait SessionMachine {
    /// Apply one event. `Shutdown` and `TransportClosed` leave the machine
    /// with no live peers and no local media.
    fn handle_event(&mut self, event: SessionEvent);

    /// Called when the host stops driving the session.
    fn shutdown(&mut self);
}

/// Drains `rx` into `machine` until shutdown or transport loss.
pub async fn drive<M: SessionMachine>(
    machine: &mut M,
    rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
) {
    while let Some(event) = rx.recv().await {
        let last = matches!(
            event,
            SessionEvent::Shutdown | SessionEvent::TransportClosed
        );
        machine.handle_event(event);
        if last {
            return;
        }
    }

    info!("Session event channel closed");
    machine.shutdown();
}
