use super::{PeerPhase, Publisher, PublisherState, ViewerPeer};
use crate::{PeerEvents, PeerInit, PeerTag};
use lullaby_core::{ConnId, Role, ServerMessage, SessionDescription};
use tracing::{debug, error, info, warn};

impl Publisher {
    pub(super) fn handle_server(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome { id } => {
                info!("Relay assigned connection id {}", id);
                self.conn_id = Some(id);
            }

            ServerMessage::PeerJoined { id, role } => self.on_peer_joined(id, role),

            ServerMessage::Signal { from, data } => self.on_signal(from, data),

            ServerMessage::PeerLeft { id } => self.on_peer_left(id),

            ServerMessage::RoomExpired { room } => {
                warn!("Room {} expired while publishing", room);
            }

            other => debug!("Publisher ignores {:?}", other),
        }
    }

    fn on_peer_joined(&mut self, viewer: ConnId, role: Role) {
        if role != Role::Viewer {
            return;
        }

        let generation = self.allocate_generation();
        let events = PeerEvents::new(
            PeerTag {
                remote: viewer,
                generation,
            },
            self.events.clone(),
        );

        let PublisherState::Streaming(streaming) = &mut self.state else {
            debug!("Not streaming; ignoring viewer {}", viewer);
            return;
        };

        if streaming.peers.contains_key(&viewer) {
            warn!("Duplicate peer-joined for viewer {}; keeping existing peer", viewer);
            return;
        }

        let init = PeerInit::Initiator {
            local: streaming.local.clone(),
        };
        match self.connector.create(init, events) {
            Ok(handle) => {
                info!("Created peer for viewer {}", viewer);
                streaming.peers.insert(
                    viewer,
                    ViewerPeer {
                        generation,
                        handle,
                        phase: PeerPhase::Pending,
                    },
                );
            }
            Err(e) => error!("Could not create peer for viewer {}: {}", viewer, e),
        }
    }

    fn on_signal(&mut self, from: ConnId, data: SessionDescription) {
        if data.is_offer() {
            warn!("Protocol violation: publisher received an offer from {}", from);
            return;
        }

        let PublisherState::Streaming(streaming) = &mut self.state else {
            return;
        };

        let Some(peer) = streaming.peers.get_mut(&from) else {
            warn!("Answer from unknown viewer {}; dropping", from);
            return;
        };

        if let Err(e) = peer.handle.signal(data) {
            error!("Peer for viewer {} rejected answer: {}", from, e);
            if let Some(mut peer) = streaming.peers.remove(&from) {
                peer.handle.destroy();
            }
        }
    }

    fn on_peer_left(&mut self, viewer: ConnId) {
        let PublisherState::Streaming(streaming) = &mut self.state else {
            return;
        };

        if let Some(mut peer) = streaming.peers.remove(&viewer) {
            info!("Viewer {} left; destroying its peer", viewer);
            peer.handle.destroy();
        }
    }
}
