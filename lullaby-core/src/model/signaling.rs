use crate::model::{ConnId, Role, RoomId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// A bundled session description. Candidates travel inside `sdp`, so each
/// peer pair exchanges exactly one offer and one answer.
///
/// Only `type` is interpreted. Every other field is carried through the
/// relay untouched, whatever its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpType,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self::with_sdp(SdpType::Offer, sdp.into())
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self::with_sdp(SdpType::Answer, sdp.into())
    }

    fn with_sdp(kind: SdpType, sdp: String) -> Self {
        let mut payload = Map::new();
        payload.insert("sdp".to_owned(), Value::String(sdp));
        Self { kind, payload }
    }

    pub fn is_offer(&self) -> bool {
        self.kind == SdpType::Offer
    }

    /// The `sdp` text, when the payload carries one as a string.
    pub fn sdp(&self) -> Option<&str> {
        self.payload.get("sdp").and_then(Value::as_str)
    }
}

/// Messages a participant sends to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join {
        room: RoomId,
        role: Role,
    },
    Signal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<ConnId>,
        room: RoomId,
        data: SessionDescription,
    },
    Leave {
        room: RoomId,
    },
}

/// Messages the relay delivers to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// First message on every connection: the id the relay assigned to it.
    Welcome { id: ConnId },
    Signal {
        from: ConnId,
        data: SessionDescription,
    },
    PeerJoined {
        id: ConnId,
        role: Role,
    },
    PeerLeft {
        id: ConnId,
    },
    PublisherAvailable {
        publisher_id: ConnId,
    },
    StreamEnded {},
    /// Sent to viewers of a room evicted by the orphan-room sweep.
    RoomExpired {
        room: RoomId,
    },
}
