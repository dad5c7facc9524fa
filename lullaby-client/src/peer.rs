use crate::{MediaStream, SessionError, SessionEvent};
use lullaby_core::{ConnId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// How a peer connection is created.
#[derive(Debug, Clone)]
pub enum PeerInit {
    /// Publisher side: sends the local stream and produces the offer.
    Initiator { local: Arc<dyn MediaStream> },
    /// Viewer side: no local stream, only ever produces an answer.
    Receiver,
}

impl PeerInit {
    pub fn is_initiator(&self) -> bool {
        matches!(self, PeerInit::Initiator { .. })
    }
}

/// Identifies one peer object: the remote connection plus a generation
/// number that is never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerTag {
    pub remote: ConnId,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// The bundled session description is ready to relay.
    Signal(SessionDescription),
    Connect,
    Stream(Arc<dyn MediaStream>),
    Error(String),
    Close,
}

/// Where a peer connection reports its events. Every event is tagged so the
/// session can tell a live peer from one it already destroyed.
#[derive(Debug, Clone)]
pub struct PeerEvents {
    tag: PeerTag,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl PeerEvents {
    pub(crate) fn new(tag: PeerTag, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tag, tx }
    }

    pub fn tag(&self) -> PeerTag {
        self.tag
    }

    /// Returns false once the owning session is gone.
    pub fn emit(&self, event: PeerEvent) -> bool {
        self.tx
            .send(SessionEvent::Peer {
                tag: self.tag,
                event,
            })
            .is_ok()
    }
}

/// A peer connection owned by a session.
pub trait PeerHandle: Send {
    /// Feed a remote session description in.
    fn signal(&mut self, data: SessionDescription) -> Result<(), SessionError>;

    /// Tear the connection down. Must not emit further events.
    fn destroy(&mut self);
}

pub trait PeerConnector: Send + Sync {
    fn create(
        &self,
        init: PeerInit,
        events: PeerEvents,
    ) -> Result<Box<dyn PeerHandle>, SessionError>;
}
