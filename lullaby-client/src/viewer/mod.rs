use crate::{
    MediaStream, PeerConnector, PeerHandle, SessionError, SessionEvent, SessionMachine,
    SignalingTransport,
};
use lullaby_core::{ClientMessage, ConnId, Role, RoomId};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

mod handle_peer_impl;
mod handle_server_impl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerPhase {
    Idle,
    AwaitingPublisher,
    AwaitingOffer,
    Answering,
    Connected,
    Ended,
    Left,
}

/// Why a viewer session stopped. An ended viewer is no longer a room member;
/// a fresh `join()` is the only way back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    StreamEnded,
    PeerError(String),
    PeerClosed,
    TransportLost,
    RoomExpired,
}

/// What the rendering layer sees.
#[derive(Debug, Clone)]
pub struct ViewerStatus {
    pub phase: ViewerPhase,
    pub stream: Option<Arc<dyn MediaStream>>,
    pub ended: Option<EndReason>,
}

impl ViewerStatus {
    fn idle() -> Self {
        Self {
            phase: ViewerPhase::Idle,
            stream: None,
            ended: None,
        }
    }
}

struct ActivePeer {
    generation: u64,
    handle: Box<dyn PeerHandle>,
}

enum ViewerState {
    Idle,
    AwaitingPublisher,
    AwaitingOffer {
        publisher: ConnId,
    },
    Answering {
        publisher: ConnId,
        peer: ActivePeer,
        answered: bool,
    },
    Connected {
        publisher: ConnId,
        peer: ActivePeer,
        stream: Arc<dyn MediaStream>,
        answered: bool,
    },
    Ended(EndReason),
    Left,
}

impl ViewerState {
    fn phase(&self) -> ViewerPhase {
        match self {
            ViewerState::Idle => ViewerPhase::Idle,
            ViewerState::AwaitingPublisher => ViewerPhase::AwaitingPublisher,
            ViewerState::AwaitingOffer { .. } => ViewerPhase::AwaitingOffer,
            ViewerState::Answering { .. } => ViewerPhase::Answering,
            ViewerState::Connected { .. } => ViewerPhase::Connected,
            ViewerState::Ended(_) => ViewerPhase::Ended,
            ViewerState::Left => ViewerPhase::Left,
        }
    }

    fn is_joined(&self) -> bool {
        !matches!(
            self,
            ViewerState::Idle | ViewerState::Ended(_) | ViewerState::Left
        )
    }

    fn peer_mut(&mut self) -> Option<&mut ActivePeer> {
        match self {
            ViewerState::Answering { peer, .. } | ViewerState::Connected { peer, .. } => {
                Some(peer)
            }
            _ => None,
        }
    }
}

/// Parent side: receives the publisher's stream over a single inbound peer
/// connection.
pub struct Viewer {
    room: RoomId,
    conn_id: Option<ConnId>,
    transport: Arc<dyn SignalingTransport>,
    connector: Arc<dyn PeerConnector>,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: ViewerState,
    status: watch::Sender<ViewerStatus>,
    next_generation: u64,
}

impl Viewer {
    pub fn new(
        room: RoomId,
        transport: Arc<dyn SignalingTransport>,
        connector: Arc<dyn PeerConnector>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (status, _) = watch::channel(ViewerStatus::idle());
        Self {
            room,
            conn_id: None,
            transport,
            connector,
            events,
            state: ViewerState::Idle,
            status,
            next_generation: 0,
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn conn_id(&self) -> Option<ConnId> {
        self.conn_id
    }

    pub fn phase(&self) -> ViewerPhase {
        self.state.phase()
    }

    /// The publisher this viewer is waiting on or connected to.
    pub fn publisher(&self) -> Option<ConnId> {
        match &self.state {
            ViewerState::AwaitingOffer { publisher }
            | ViewerState::Answering { publisher, .. }
            | ViewerState::Connected { publisher, .. } => Some(*publisher),
            _ => None,
        }
    }

    pub fn has_peer(&self) -> bool {
        matches!(
            self.state,
            ViewerState::Answering { .. } | ViewerState::Connected { .. }
        )
    }

    pub fn status(&self) -> ViewerStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewerStatus> {
        self.status.subscribe()
    }

    /// Join the room as a viewer. Allowed from `Idle`, `Ended` and `Left`.
    pub fn join(&mut self) -> Result<(), SessionError> {
        if self.state.is_joined() {
            return Err(SessionError::InvalidState("already joined"));
        }

        self.transport.send(ClientMessage::Join {
            room: self.room.clone(),
            role: Role::Viewer,
        })?;

        info!("Joined room {} as viewer", self.room);
        self.set_state(ViewerState::AwaitingPublisher);
        Ok(())
    }

    /// Leave the room, destroy the peer and drop the remote stream.
    ///
    /// An ended session has already left the room, so only local state is
    /// released.
    pub fn leave(&mut self) {
        match &self.state {
            ViewerState::Idle | ViewerState::Left => return,
            ViewerState::Ended(_) => {}
            _ => self.send_leave(),
        }

        info!("Left room {}", self.room);
        self.set_state(ViewerState::Left);
    }

    /// Moves to `Ended`. Unless the relay already dropped our membership,
    /// the room is left so a returning publisher does not offer to us.
    fn end(&mut self, reason: EndReason) {
        if !self.state.is_joined() {
            return;
        }
        info!("Viewer session in room {} ended: {:?}", self.room, reason);
        if !matches!(reason, EndReason::TransportLost | EndReason::RoomExpired) {
            self.send_leave();
        }
        self.set_state(ViewerState::Ended(reason));
    }

    fn send_leave(&self) {
        let leave = ClientMessage::Leave {
            room: self.room.clone(),
        };
        if let Err(e) = self.transport.send(leave) {
            warn!("Could not send leave for room {}: {}", self.room, e);
        }
    }

    /// Replaces the state, destroying whatever peer and stream the old one
    /// held, then publishes the new status.
    fn set_state(&mut self, next: ViewerState) {
        match std::mem::replace(&mut self.state, next) {
            ViewerState::Answering { mut peer, .. } => peer.handle.destroy(),
            ViewerState::Connected {
                mut peer, stream, ..
            } => {
                peer.handle.destroy();
                stream.stop();
            }
            _ => {}
        }
        self.publish();
    }

    /// `Answering -> Connected`, keeping the same peer.
    fn promote(&mut self, stream: Arc<dyn MediaStream>) {
        self.state = match std::mem::replace(&mut self.state, ViewerState::Idle) {
            ViewerState::Answering {
                publisher,
                peer,
                answered,
            } => ViewerState::Connected {
                publisher,
                peer,
                stream,
                answered,
            },
            other => other,
        };
        self.publish();
    }

    fn publish(&self) {
        let status = match &self.state {
            ViewerState::Connected { stream, .. } => ViewerStatus {
                phase: ViewerPhase::Connected,
                stream: Some(stream.clone()),
                ended: None,
            },
            ViewerState::Ended(reason) => ViewerStatus {
                phase: ViewerPhase::Ended,
                stream: None,
                ended: Some(reason.clone()),
            },
            other => ViewerStatus {
                phase: other.phase(),
                stream: None,
                ended: None,
            },
        };
        self.status.send_replace(status);
    }

    fn allocate_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

impl SessionMachine for Viewer {
    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Server(msg) => self.handle_server(msg),
            SessionEvent::Peer { tag, event } => self.handle_peer(tag, event),
            SessionEvent::TransportClosed => self.end(EndReason::TransportLost),
            SessionEvent::Shutdown => self.leave(),
        }
    }

    fn shutdown(&mut self) {
        self.leave();
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.leave();
    }
}
