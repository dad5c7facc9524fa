use async_trait::async_trait;
use lullaby_client::{MediaCapture, MediaStream, RecordingCapture, SessionError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct MockStream {
    id: String,
    stopped: AtomicBool,
}

impl MockStream {
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            stopped: AtomicBool::new(false),
        })
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl MediaStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Mock camera/microphone. Hands out a fresh `MockStream` per acquire.
#[derive(Clone, Default)]
pub struct MockMedia {
    fail: Arc<AtomicBool>,
    acquired: Arc<Mutex<Vec<Arc<MockStream>>>>,
}

impl MockMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capture whose every acquire fails, like a denied permission prompt.
    pub fn denied() -> Self {
        let media = Self::default();
        media.fail.store(true, Ordering::SeqCst);
        media
    }

    pub fn acquired(&self) -> Vec<Arc<MockStream>> {
        self.acquired.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Arc<MockStream>> {
        self.acquired.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MediaCapture for MockMedia {
    async fn acquire(&self) -> Result<Arc<dyn MediaStream>, SessionError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SessionError::MediaAcquisition(
                "permission denied".to_owned(),
            ));
        }

        let mut acquired = self.acquired.lock().unwrap();
        let stream = MockStream::new(format!("local-{}", acquired.len()));
        acquired.push(stream.clone());
        Ok(stream as Arc<dyn MediaStream>)
    }
}

/// Mock recorder counting start/stop calls.
#[derive(Clone, Default)]
pub struct MockRecording {
    started: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl MockRecording {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let recording = Self::default();
        recording.fail.store(true, Ordering::SeqCst);
        recording
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl RecordingCapture for MockRecording {
    fn start(&mut self, _stream: Arc<dyn MediaStream>) -> Result<(), SessionError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SessionError::MediaAcquisition("no storage".to_owned()));
        }
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}
