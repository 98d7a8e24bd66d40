//! Controller inputs, notices and status snapshots

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::engine::EngineEvent;
use crate::errors::{Result, SessionError};
use crate::timers::TimerKind;
use crate::types::{ConnectionEvidence, NegotiationPhase, Role, SessionEpoch};

/// User intents accepted by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Begin a host session
    Start,
    /// Begin a guest session
    Join,
    /// A token scanned while waiting for an offer
    OfferReceived(String),
    /// Host confirms the guest has scanned the offer
    GuestScanned,
    /// A token scanned while waiting for an answer
    AnswerReceived(String),
    /// Manually pasted text, dispatched by the current phase
    Paste(String),
    /// Tear down any live session
    End,
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Join => "join",
            Command::OfferReceived(_) => "offer_received",
            Command::GuestScanned => "guest_scanned",
            Command::AnswerReceived(_) => "answer_received",
            Command::Paste(_) => "paste",
            Command::End => "end",
        }
    }
}

/// Everything the controller task consumes, in arrival order
#[derive(Debug)]
pub(crate) enum ControllerInput {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<()>>,
    },
    Engine {
        epoch: SessionEpoch,
        event: EngineEvent,
    },
    Timer {
        epoch: SessionEpoch,
        kind: TimerKind,
        seq: u64,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Transient, non-fatal conditions shown to the user
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum SessionWarning {
    /// Gathering timed out; the code carries the candidates found so far
    GatheringIncomplete,
    /// Preferred capture failed; continuing with the fallback constraints
    CaptureDegraded,
    /// Connected was entered on stable signaling alone
    AssumedConnected,
    /// Transport dropped but may recover
    ConnectionInterrupted,
}

/// Published on every observable change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerNotice {
    PhaseChanged {
        epoch: SessionEpoch,
        from: NegotiationPhase,
        to: NegotiationPhase,
    },
    /// The local code is ready to display
    TokenReady {
        epoch: SessionEpoch,
        role: Role,
        token: String,
    },
    Warning(SessionWarning),
    WarningDismissed,
    Error(SessionError),
}

/// Snapshot of the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    pub phase: NegotiationPhase,
    pub role: Option<Role>,
    pub epoch: Option<SessionEpoch>,
    /// Token to render as a code while in a ready phase
    pub local_token: Option<String>,
    pub failure: Option<SessionError>,
    pub evidence: Option<ConnectionEvidence>,
}

impl ControllerStatus {
    pub fn idle() -> Self {
        Self {
            phase: NegotiationPhase::Idle,
            role: None,
            epoch: None,
            local_token: None,
            failure: None,
            evidence: None,
        }
    }

    /// Whether Connected was reached on an assumption
    pub fn connection_assumed(&self) -> bool {
        self.evidence.map_or(false, |e| e.is_assumed())
    }
}

impl Default for ControllerStatus {
    fn default() -> Self {
        Self::idle()
    }
}
