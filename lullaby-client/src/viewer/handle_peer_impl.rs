use super::{EndReason, Viewer, ViewerState};
use crate::{PeerEvent, PeerTag};
use lullaby_core::ClientMessage;
use tracing::{debug, info, warn};

impl Viewer {
    pub(super) fn handle_peer(&mut self, tag: PeerTag, event: PeerEvent) {
        let (publisher, answered) = match &mut self.state {
            ViewerState::Answering {
                publisher,
                peer,
                answered,
            }
            | ViewerState::Connected {
                publisher,
                peer,
                answered,
                ..
            } if peer.generation == tag.generation && *publisher == tag.remote => {
                (*publisher, answered)
            }
            _ => {
                debug!("Dropping event from stale peer {:?}", tag);
                return;
            }
        };

        match event {
            PeerEvent::Signal(data) => {
                if *answered || data.is_offer() {
                    warn!("Unexpected local signal for {}; dropping", publisher);
                    return;
                }

                let msg = ClientMessage::Signal {
                    to: Some(publisher),
                    room: self.room.clone(),
                    data,
                };
                match self.transport.send(msg) {
                    Ok(()) => *answered = true,
                    Err(e) => warn!("Could not relay answer to {}: {}", publisher, e),
                }
            }

            PeerEvent::Connect => info!("Peer connected to publisher {}", publisher),

            PeerEvent::Stream(stream) => {
                if matches!(self.state, ViewerState::Connected { .. }) {
                    debug!("Duplicate remote stream {}; ignoring", stream.id());
                    return;
                }
                info!("Remote stream {} available", stream.id());
                self.promote(stream);
            }

            PeerEvent::Error(reason) => {
                warn!("Peer to publisher {} failed: {}", publisher, reason);
                self.end(EndReason::PeerError(reason));
            }

            PeerEvent::Close => {
                info!("Peer to publisher {} closed", publisher);
                self.end(EndReason::PeerClosed);
            }
        }
    }
}
