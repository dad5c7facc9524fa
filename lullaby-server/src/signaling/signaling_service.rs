use crate::room::RelayHandle;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use lullaby_core::{ConnId, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

struct SignalingInner {
    peers: DashMap<ConnId, mpsc::UnboundedSender<Message>>,
}

/// Table of live WebSocket connections plus the relay they feed.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    relay: RelayHandle,
}

impl SignalingService {
    pub fn new(relay: RelayHandle) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                peers: DashMap::new(),
            }),
            relay,
        }
    }

    pub fn relay(&self) -> &RelayHandle {
        &self.relay
    }

    pub fn add_peer(&self, conn: ConnId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(conn, tx);
    }

    pub fn remove_peer(&self, conn: &ConnId) {
        self.inner.peers.remove(conn);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.peers.len()
    }

    pub fn send_signal(&self, conn: ConnId, msg: &ServerMessage) {
        if let Some(peer) = self.inner.peers.get(&conn) {
            match serde_json::to_string(msg) {
                Ok(json) => {
                    if let Err(e) = peer.send(Message::Text(json.into())) {
                        error!("Failed to send WS message to {}: {:?}", conn, e);
                    }
                }
                Err(e) => error!("Failed to serialize server message: {}", e),
            }
        } else {
            warn!("Attempted to send {:?} to disconnected connection {}", msg, conn);
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn deliver(&self, to: ConnId, message: ServerMessage) {
        debug!("Delivering to {}: {:?}", to, message);
        self.send_signal(to, &message);
    }
}
