use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The signaling connection is gone. Local state is reset and the
    /// session has to be joined again.
    #[error("signaling transport lost: {0}")]
    Transport(String),

    /// A message arrived out of order or for an unknown peer.
    #[error("signaling protocol violation: {0}")]
    Protocol(String),

    /// Camera/microphone could not be opened.
    #[error("media acquisition failed: {0}")]
    MediaAcquisition(String),

    /// Reported by a peer connection; only that peer pair is affected.
    #[error("peer negotiation failed: {0}")]
    PeerNegotiation(String),

    #[error("operation not allowed while {0}")]
    InvalidState(&'static str),
}
