use crate::{
    MediaCapture, MediaStream, PeerConnector, PeerHandle, RecordingCapture, SessionError,
    SessionEvent, SessionMachine, SignalingTransport,
};
use lullaby_core::{ClientMessage, ConnId, Role, RoomId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod handle_peer_impl;
mod handle_server_impl;

/// Lifecycle of one publisher-side peer. A closed peer is simply removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerPhase {
    /// Created, offer not produced yet
    Pending,
    /// Offer relayed to the viewer
    Offered,
    Connected,
}

struct ViewerPeer {
    generation: u64,
    handle: Box<dyn PeerHandle>,
    phase: PeerPhase,
}

struct Streaming {
    local: Arc<dyn MediaStream>,
    peers: HashMap<ConnId, ViewerPeer>,
}

enum PublisherState {
    Idle,
    Streaming(Streaming),
}

/// Caretaker side: shares local media with every viewer in one room,
/// one outbound peer connection per viewer.
pub struct Publisher {
    room: RoomId,
    conn_id: Option<ConnId>,
    transport: Arc<dyn SignalingTransport>,
    connector: Arc<dyn PeerConnector>,
    media: Arc<dyn MediaCapture>,
    recording: Box<dyn RecordingCapture>,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: PublisherState,
    next_generation: u64,
}

impl Publisher {
    pub fn new(
        room: RoomId,
        transport: Arc<dyn SignalingTransport>,
        connector: Arc<dyn PeerConnector>,
        media: Arc<dyn MediaCapture>,
        recording: Box<dyn RecordingCapture>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            room,
            conn_id: None,
            transport,
            connector,
            media,
            recording,
            events,
            state: PublisherState::Idle,
            next_generation: 0,
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// The id the relay assigned to our connection, once welcomed.
    pub fn conn_id(&self) -> Option<ConnId> {
        self.conn_id
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.state, PublisherState::Streaming(_))
    }

    pub fn peer_count(&self) -> usize {
        match &self.state {
            PublisherState::Streaming(s) => s.peers.len(),
            PublisherState::Idle => 0,
        }
    }

    pub fn peer_phase(&self, viewer: &ConnId) -> Option<PeerPhase> {
        match &self.state {
            PublisherState::Streaming(s) => s.peers.get(viewer).map(|p| p.phase),
            PublisherState::Idle => None,
        }
    }

    /// Acquire local media, join the room as publisher and start recording.
    ///
    /// A media failure leaves the publisher idle and is returned as is;
    /// nothing is retried.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.is_streaming() {
            return Err(SessionError::InvalidState("already streaming"));
        }

        let local = match self.media.acquire().await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to acquire local media: {}", e);
                return Err(e);
            }
        };
        info!("Local media acquired: {}", local.id());

        let join = ClientMessage::Join {
            room: self.room.clone(),
            role: Role::Publisher,
        };
        if let Err(e) = self.transport.send(join) {
            local.stop();
            return Err(e);
        }

        self.state = PublisherState::Streaming(Streaming {
            local: local.clone(),
            peers: HashMap::new(),
        });
        info!("Streaming into room {}", self.room);

        if let Err(e) = self.recording.start(local) {
            warn!("Recording did not start: {}", e);
        }

        Ok(())
    }

    /// Destroy every peer, stop local media, leave the room and stop
    /// recording. No-op when idle.
    pub fn teardown(&mut self) {
        if !self.release() {
            return;
        }

        let leave = ClientMessage::Leave {
            room: self.room.clone(),
        };
        if let Err(e) = self.transport.send(leave) {
            warn!("Could not send leave for room {}: {}", self.room, e);
        }
        info!("Stopped streaming into room {}", self.room);
    }

    /// Drop all local state without talking to the relay.
    fn transport_lost(&mut self) {
        if self.release() {
            warn!("Signaling transport lost; publisher reset, rejoin required");
        }
    }

    fn release(&mut self) -> bool {
        let PublisherState::Streaming(streaming) =
            std::mem::replace(&mut self.state, PublisherState::Idle)
        else {
            return false;
        };

        for (viewer, mut peer) in streaming.peers {
            info!("Destroying peer for viewer {}", viewer);
            peer.handle.destroy();
        }
        streaming.local.stop();
        self.recording.stop();
        true
    }

    fn allocate_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

impl SessionMachine for Publisher {
    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Server(msg) => self.handle_server(msg),
            SessionEvent::Peer { tag, event } => self.handle_peer(tag, event),
            SessionEvent::TransportClosed => self.transport_lost(),
            SessionEvent::Shutdown => self.teardown(),
        }
    }

    fn shutdown(&mut self) {
        self.teardown();
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.teardown();
    }
}
