//! Session vocabulary shared by the controller and its collaborators

use std::fmt;

use serde::{Deserialize, Serialize};

use qrlink_sdp_core::SdpKind;

/// Which side of the exchange a session plays
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Produces the offer, consumes the answer
    Host,
    /// Consumes the offer, produces the answer
    Guest,
}

impl Role {
    /// Kind of description this side produces
    pub fn local_kind(&self) -> SdpKind {
        match self {
            Role::Host => SdpKind::Offer,
            Role::Guest => SdpKind::Answer,
        }
    }

    /// Kind of description this side expects to receive
    pub fn remote_kind(&self) -> SdpKind {
        match self {
            Role::Host => SdpKind::Answer,
            Role::Guest => SdpKind::Offer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Guest => write!(f, "guest"),
        }
    }
}

/// Controller phase
///
/// `Idle` is the only phase without a live session. Host sessions move
/// through `CreatingOffer -> OfferReady -> AwaitingAnswer -> Connected`,
/// guest sessions through `AwaitingOffer -> CreatingAnswer -> AnswerReady ->
/// Connected`. `Failed` is terminal until the session is ended.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum NegotiationPhase {
    Idle,
    CreatingOffer,
    OfferReady,
    AwaitingAnswer,
    AwaitingOffer,
    CreatingAnswer,
    AnswerReady,
    Connected,
    Failed,
}

impl NegotiationPhase {
    /// Whether a live, non-failed session is in this phase
    pub fn is_active(&self) -> bool {
        !matches!(self, NegotiationPhase::Idle | NegotiationPhase::Failed)
    }

    /// Whether the local description is still being produced
    pub fn is_creating(&self) -> bool {
        matches!(
            self,
            NegotiationPhase::CreatingOffer | NegotiationPhase::CreatingAnswer
        )
    }

    /// Kind of scanned or pasted token accepted in this phase
    pub fn accepted_kind(&self) -> Option<SdpKind> {
        match self {
            NegotiationPhase::AwaitingOffer => Some(SdpKind::Offer),
            NegotiationPhase::AwaitingAnswer => Some(SdpKind::Answer),
            _ => None,
        }
    }
}

impl fmt::Display for NegotiationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationPhase::Idle => "idle",
            NegotiationPhase::CreatingOffer => "creating offer",
            NegotiationPhase::OfferReady => "offer ready",
            NegotiationPhase::AwaitingAnswer => "awaiting answer",
            NegotiationPhase::AwaitingOffer => "awaiting offer",
            NegotiationPhase::CreatingAnswer => "creating answer",
            NegotiationPhase::AnswerReady => "answer ready",
            NegotiationPhase::Connected => "connected",
            NegotiationPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Monotonic session identity; inputs tagged with an older epoch are stale
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionEpoch(pub u64);

impl SessionEpoch {
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// What justified entering `Connected`
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum ConnectionEvidence {
    /// Host applied the remote answer
    AnswerApplied,
    /// Engine reported the transport connected
    TransportConnected,
    /// A remote track arrived after the answer was created
    InboundMedia,
    /// Fallback timer fired with signaling stable and nothing else observed
    StableFallback,
}

impl ConnectionEvidence {
    /// Whether the evidence is an assumption rather than an observation
    pub fn is_assumed(&self) -> bool {
        matches!(self, ConnectionEvidence::StableFallback)
    }
}

/// Offer/answer state of the engine
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum SignalingState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    HaveLocalPranswer,
    HaveRemotePranswer,
    Closed,
}

impl SignalingState {
    /// Whether a remote answer can be applied now
    pub fn expects_remote_answer(&self) -> bool {
        matches!(
            self,
            SignalingState::HaveLocalOffer | SignalingState::HaveRemotePranswer
        )
    }

    /// States an answerer is in once its answer exists
    pub fn after_answer(&self) -> bool {
        matches!(self, SignalingState::Stable | SignalingState::HaveRemoteOffer)
    }
}

impl fmt::Display for SignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalingState::Stable => "stable",
            SignalingState::HaveLocalOffer => "have-local-offer",
            SignalingState::HaveRemoteOffer => "have-remote-offer",
            SignalingState::HaveLocalPranswer => "have-local-pranswer",
            SignalingState::HaveRemotePranswer => "have-remote-pranswer",
            SignalingState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Candidate gathering progress
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum GatheringState {
    New,
    Gathering,
    Complete,
}

/// Transport connectivity as reported by the engine
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum ConnectivityState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectivityState {
    pub fn is_established(&self) -> bool {
        matches!(
            self,
            ConnectivityState::Connected | ConnectivityState::Completed
        )
    }
}

/// Kind of a media track
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}
