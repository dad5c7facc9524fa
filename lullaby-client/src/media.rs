use crate::SessionError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A live audio/video stream, local or remote.
pub trait MediaStream: fmt::Debug + Send + Sync {
    fn id(&self) -> &str;

    /// Release the underlying devices/tracks.
    fn stop(&self);
}

/// Access to the local camera and microphone.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn acquire(&self) -> Result<Arc<dyn MediaStream>, SessionError>;
}

/// Records the outbound stream while the publisher is live. Where the
/// recording ends up is the implementor's business.
pub trait RecordingCapture: Send {
    fn start(&mut self, stream: Arc<dyn MediaStream>) -> Result<(), SessionError>;

    fn stop(&mut self);
}

/// Recording capture that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecording;

impl RecordingCapture for NoRecording {
    fn start(&mut self, _stream: Arc<dyn MediaStream>) -> Result<(), SessionError> {
        Ok(())
    }

    fn stop(&mut self) {}
}
