//! Peer-connection engine seam
//!
//! The controller never touches a transport itself. It drives an engine that
//! owns offer/answer state, candidate gathering and connectivity checks, and
//! hears back from it through an [`EngineEventSink`] bound to one session.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::capture::LocalMedia;
use crate::events::ControllerInput;
use crate::types::{ConnectivityState, GatheringState, SessionEpoch, SignalingState, TrackKind};
use qrlink_sdp_core::SessionDescription;

/// Engine-level failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Operation not valid in signaling state {0}")]
    WrongSignalingState(SignalingState),

    #[error("Description rejected: {0}")]
    Rejected(String),

    #[error("Engine closed")]
    Closed,

    #[error("Engine failure: {0}")]
    Internal(String),
}

/// Asynchronous notifications from an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A local candidate line; `None` marks the end of gathering
    CandidateDiscovered(Option<String>),
    GatheringStateChanged(GatheringState),
    ConnectivityStateChanged(ConnectivityState),
    SignalingStateChanged(SignalingState),
    /// A remote track started arriving
    TrackArrived(TrackKind),
}

/// Offer/answer engine driven by the controller
#[async_trait]
pub trait NegotiationEngine: Send + Sync {
    async fn add_local_media(&self, media: Arc<dyn LocalMedia>) -> Result<(), EngineError>;

    async fn create_local_offer(&self) -> Result<SessionDescription, EngineError>;

    async fn create_local_answer(&self) -> Result<SessionDescription, EngineError>;

    async fn set_local_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), EngineError>;

    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), EngineError>;

    /// Current local description including candidates gathered so far
    fn local_description(&self) -> Option<SessionDescription>;

    fn gathering_state(&self) -> GatheringState;

    fn connectivity_state(&self) -> ConnectivityState;

    fn signaling_state(&self) -> SignalingState;

    /// Release transports; called once per session
    async fn close(&self);
}

/// Creates one engine per session
pub trait EngineFactory: Send + Sync {
    fn create(&self, events: EngineEventSink) -> Result<Arc<dyn NegotiationEngine>, EngineError>;
}

/// Delivers engine events to the controller, tagged with their session
#[derive(Clone)]
pub struct EngineEventSink {
    epoch: SessionEpoch,
    inbox: mpsc::WeakUnboundedSender<ControllerInput>,
}

impl EngineEventSink {
    pub(crate) fn new(
        epoch: SessionEpoch,
        inbox: mpsc::WeakUnboundedSender<ControllerInput>,
    ) -> Self {
        Self { epoch, inbox }
    }

    /// Session this sink belongs to
    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    /// Queue an event; false once the controller has stopped
    pub fn emit(&self, event: EngineEvent) -> bool {
        let Some(inbox) = self.inbox.upgrade() else {
            return false;
        };
        inbox
            .send(ControllerInput::Engine {
                epoch: self.epoch,
                event,
            })
            .is_ok()
    }
}

impl fmt::Debug for EngineEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineEventSink")
            .field("epoch", &self.epoch)
            .finish()
    }
}
