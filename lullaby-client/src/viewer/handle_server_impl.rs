use super::{ActivePeer, EndReason, Viewer, ViewerState};
use crate::{PeerEvents, PeerInit, PeerTag};
use lullaby_core::{ConnId, ServerMessage, SessionDescription};
use tracing::{debug, error, info, warn};

impl Viewer {
    pub(super) fn handle_server(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome { id } => {
                info!("Relay assigned connection id {}", id);
                self.conn_id = Some(id);
            }

            ServerMessage::PublisherAvailable { publisher_id } => {
                if matches!(self.state, ViewerState::AwaitingPublisher) {
                    info!("Publisher {} available in room {}", publisher_id, self.room);
                    self.set_state(ViewerState::AwaitingOffer {
                        publisher: publisher_id,
                    });
                }
            }

            ServerMessage::Signal { from, data } => self.on_signal(from, data),

            ServerMessage::StreamEnded {} => self.end(EndReason::StreamEnded),

            ServerMessage::RoomExpired { room } => {
                warn!("Room {} expired", room);
                self.end(EndReason::RoomExpired);
            }

            other => debug!("Viewer ignores {:?}", other),
        }
    }

    fn on_signal(&mut self, from: ConnId, data: SessionDescription) {
        if !data.is_offer() {
            if self.publisher() != Some(from) {
                debug!("Signal from {} is not from our publisher; dropping", from);
                return;
            }
            let Some(peer) = self.state.peer_mut() else {
                debug!("No peer for signal from {}; dropping", from);
                return;
            };
            if let Err(e) = peer.handle.signal(data) {
                error!("Peer rejected signal from {}: {}", from, e);
                self.end(EndReason::PeerError(e.to_string()));
            }
            return;
        }

        match &self.state {
            ViewerState::AwaitingPublisher | ViewerState::AwaitingOffer { .. } => {}
            ViewerState::Answering { .. } | ViewerState::Connected { .. } => {
                warn!("Duplicate offer from {}; keeping existing peer", from);
                return;
            }
            _ => {
                debug!("Not joined; dropping offer from {}", from);
                return;
            }
        }

        let generation = self.allocate_generation();
        let events = PeerEvents::new(
            PeerTag {
                remote: from,
                generation,
            },
            self.events.clone(),
        );

        let mut handle = match self.connector.create(PeerInit::Receiver, events) {
            Ok(handle) => handle,
            Err(e) => {
                error!("Could not create receiving peer: {}", e);
                self.end(EndReason::PeerError(e.to_string()));
                return;
            }
        };

        if let Err(e) = handle.signal(data) {
            error!("Peer rejected offer from {}: {}", from, e);
            handle.destroy();
            self.end(EndReason::PeerError(e.to_string()));
            return;
        }

        info!("Answering offer from publisher {}", from);
        self.set_state(ViewerState::Answering {
            publisher: from,
            peer: ActivePeer { generation, handle },
            answered: false,
        });
    }
}
