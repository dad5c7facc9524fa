use super::{PeerPhase, Publisher, PublisherState};
use crate::{PeerEvent, PeerTag};
use lullaby_core::ClientMessage;
use tracing::{debug, info, warn};

impl Publisher {
    pub(super) fn handle_peer(&mut self, tag: PeerTag, event: PeerEvent) {
        let PublisherState::Streaming(streaming) = &mut self.state else {
            return;
        };

        let viewer = tag.remote;
        let Some(peer) = streaming
            .peers
            .get_mut(&viewer)
            .filter(|p| p.generation == tag.generation)
        else {
            debug!("Dropping event from stale peer {:?}", tag);
            return;
        };

        match event {
            PeerEvent::Signal(data) => {
                if peer.phase != PeerPhase::Pending || !data.is_offer() {
                    warn!("Unexpected local signal for viewer {}; dropping", viewer);
                    return;
                }

                let msg = ClientMessage::Signal {
                    to: Some(viewer),
                    room: self.room.clone(),
                    data,
                };
                match self.transport.send(msg) {
                    Ok(()) => peer.phase = PeerPhase::Offered,
                    Err(e) => warn!("Could not relay offer to {}: {}", viewer, e),
                }
            }

            PeerEvent::Connect => {
                info!("Peer connected to viewer {}", viewer);
                peer.phase = PeerPhase::Connected;
            }

            PeerEvent::Stream(_) => {}

            PeerEvent::Error(reason) => {
                warn!("Peer for viewer {} failed: {}", viewer, reason);
                if let Some(mut peer) = streaming.peers.remove(&viewer) {
                    peer.handle.destroy();
                }
            }

            PeerEvent::Close => {
                info!("Peer for viewer {} closed", viewer);
                if let Some(mut peer) = streaming.peers.remove(&viewer) {
                    peer.handle.destroy();
                }
            }
        }
    }
}
