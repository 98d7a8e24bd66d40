//! Scripted capture device

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use qrlink_session_core::{CaptureError, LocalMedia, MediaCapture, MediaConstraints, TrackKind};

#[derive(Debug)]
pub struct MockMedia {
    tracks: Vec<TrackKind>,
    stopped: AtomicBool,
}

impl MockMedia {
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl LocalMedia for MockMedia {
    fn tracks(&self) -> Vec<TrackKind> {
        self.tracks.clone()
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

pub struct MockCapture {
    failures_left: AtomicUsize,
    requests: Mutex<Vec<MediaConstraints>>,
    acquired: Mutex<Vec<Arc<MockMedia>>>,
}

impl MockCapture {
    pub fn new() -> Arc<Self> {
        Self::failing(0)
    }

    /// Refuse the first `times` requests
    pub fn failing(times: usize) -> Arc<Self> {
        Arc::new(Self {
            failures_left: AtomicUsize::new(times),
            requests: Mutex::new(Vec::new()),
            acquired: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<MediaConstraints> {
        self.requests.lock().unwrap().clone()
    }

    pub fn acquired(&self) -> Vec<Arc<MockMedia>> {
        self.acquired.lock().unwrap().clone()
    }

    pub fn all_stopped(&self) -> bool {
        self.acquired().iter().all(|media| media.is_stopped())
    }
}

#[async_trait]
impl MediaCapture for MockCapture {
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Arc<dyn LocalMedia>, CaptureError> {
        self.requests.lock().unwrap().push(constraints);

        let refuse = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refuse {
            return Err(CaptureError::PermissionDenied("device refused by test".into()));
        }

        let media = Arc::new(MockMedia {
            tracks: constraints.kinds(),
            stopped: AtomicBool::new(false),
        });
        self.acquired.lock().unwrap().push(media.clone());
        let media: Arc<dyn LocalMedia> = media;
        Ok(media)
    }
}
