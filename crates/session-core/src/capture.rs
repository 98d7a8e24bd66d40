//! Local media acquisition

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::TrackKind;

/// Which local tracks to request
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub const AUDIO_VIDEO: Self = Self {
        audio: true,
        video: true,
    };

    pub const AUDIO_ONLY: Self = Self {
        audio: true,
        video: false,
    };

    /// Whether the constraints request anything at all
    pub fn is_empty(&self) -> bool {
        !self.audio && !self.video
    }

    /// Track kinds these constraints ask for
    pub fn kinds(&self) -> Vec<TrackKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.audio {
            kinds.push(TrackKind::Audio);
        }
        if self.video {
            kinds.push(TrackKind::Video);
        }
        kinds
    }
}

impl fmt::Display for MediaConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.audio, self.video) {
            (true, true) => write!(f, "audio+video"),
            (true, false) => write!(f, "audio"),
            (false, true) => write!(f, "video"),
            (false, false) => write!(f, "none"),
        }
    }
}

/// Device-level capture failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No device satisfies {0}")]
    Unavailable(MediaConstraints),

    #[error("Capture device error: {0}")]
    Device(String),
}

/// Tracks obtained from a capture device
pub trait LocalMedia: Send + Sync + fmt::Debug {
    /// Kinds of the tracks held
    fn tracks(&self) -> Vec<TrackKind>;

    /// Stop every track; calling twice is harmless
    fn stop(&self);
}

/// Source of local media
///
/// `acquire` is awaited on the controller task, so commands queued behind it
/// (including `end`) wait until it returns. Implementations that can block on
/// a user prompt should bound it themselves.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> std::result::Result<Arc<dyn LocalMedia>, CaptureError>;
}
