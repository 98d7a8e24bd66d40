//! State owned by one negotiation attempt

use std::sync::Arc;

use tokio::time::Instant;
use tracing::debug;

use crate::capture::LocalMedia;
use crate::engine::NegotiationEngine;
use crate::errors::SessionError;
use crate::timers::TimerSet;
use crate::types::{ConnectionEvidence, NegotiationPhase, Role, SessionEpoch, TrackKind};
use qrlink_sdp_core::SessionDescription;

/// One start-to-end negotiation attempt
///
/// Owned exclusively by the controller task. Ending the session cancels its
/// timers, stops its local tracks and closes its engine; anything the engine
/// emits afterwards carries a stale epoch and is discarded.
pub struct NegotiationSession {
    pub(crate) epoch: SessionEpoch,
    pub(crate) role: Role,
    pub(crate) phase: NegotiationPhase,
    pub(crate) engine: Arc<dyn NegotiationEngine>,
    pub(crate) local_media: Option<Arc<dyn LocalMedia>>,
    pub(crate) local_description: Option<SessionDescription>,
    pub(crate) remote_description: Option<SessionDescription>,
    pub(crate) local_token: Option<String>,
    /// Remote answer waiting for its retry
    pub(crate) pending_answer: Option<SessionDescription>,
    pub(crate) answer_attempts: u32,
    pub(crate) remote_tracks: Vec<TrackKind>,
    pub(crate) evidence: Option<ConnectionEvidence>,
    pub(crate) failure: Option<SessionError>,
    pub(crate) timers: TimerSet,
    pub(crate) opened_at: Instant,
}

impl NegotiationSession {
    pub(crate) fn new(
        epoch: SessionEpoch,
        role: Role,
        engine: Arc<dyn NegotiationEngine>,
        timers: TimerSet,
    ) -> Self {
        Self {
            epoch,
            role,
            phase: NegotiationPhase::Idle,
            engine,
            local_media: None,
            local_description: None,
            remote_description: None,
            local_token: None,
            pending_answer: None,
            answer_attempts: 0,
            remote_tracks: Vec::new(),
            evidence: None,
            failure: None,
            timers,
            opened_at: Instant::now(),
        }
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn phase(&self) -> NegotiationPhase {
        self.phase
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn local_token(&self) -> Option<&str> {
        self.local_token.as_deref()
    }

    pub fn evidence(&self) -> Option<ConnectionEvidence> {
        self.evidence
    }

    pub fn failure(&self) -> Option<&SessionError> {
        self.failure.as_ref()
    }

    pub fn remote_tracks(&self) -> &[TrackKind] {
        &self.remote_tracks
    }

    /// Cancel timers, stop local tracks and close the engine
    pub(crate) async fn teardown(&mut self) {
        let cancelled = self.timers.cancel_all();
        if let Some(media) = self.local_media.take() {
            media.stop();
        }
        self.engine.close().await;
        self.pending_answer = None;
        debug!(
            "Tore down {} after {:?} ({} timers cancelled)",
            self.epoch,
            self.opened_at.elapsed(),
            cancelled
        );
    }
}
