//! # qrlink-session-core
//!
//! Drives one offer/answer negotiation at a time between two devices that
//! exchange their descriptions as scanned codes.
//!
//! The controller runs as a single task. User commands, engine events and
//! timer firings all arrive on one inbox and are handled strictly in order.
//! Each negotiation attempt is a [`NegotiationSession`] stamped with a
//! [`SessionEpoch`]; ending it cancels its timers and closes its engine, and
//! anything still in flight for an older epoch is dropped on arrival.
//!
//! ## Host
//!
//! `start()` captures media, creates the offer and waits for candidate
//! gathering (bounded by the gather timeout). The encoded offer is published
//! as a [`ControllerNotice::TokenReady`] in `OfferReady`. Once the guest has
//! scanned it, `guest_scanned()` moves to `AwaitingAnswer`, and a scanned or
//! pasted answer takes the session to `Connected`.
//!
//! ## Guest
//!
//! `join()` waits in `AwaitingOffer`. A scanned or pasted offer is applied,
//! the answer created and published in `AnswerReady`. The guest enters
//! `Connected` when the transport connects, a remote track arrives, or the
//! fallback timer fires with signaling stable.
//!
//! The peer-connection engine and media capture are supplied by the caller
//! through [`EngineFactory`] and [`MediaCapture`].

pub mod capture;
pub mod config;
pub mod controller;
pub mod engine;
pub mod errors;
pub mod events;
pub mod session;
pub mod timers;
pub mod types;

pub use capture::{CaptureError, LocalMedia, MediaCapture, MediaConstraints};
pub use config::{ConfigError, ControllerConfig};
pub use controller::ControllerHandle;
pub use engine::{EngineError, EngineEvent, EngineEventSink, EngineFactory, NegotiationEngine};
pub use errors::{Result, SessionError};
pub use events::{Command, ControllerNotice, ControllerStatus, SessionWarning};
pub use session::NegotiationSession;
pub use timers::TimerKind;
pub use types::{
    ConnectionEvidence, ConnectivityState, GatheringState, NegotiationPhase, Role, SessionEpoch,
    SignalingState, TrackKind,
};

pub use qrlink_sdp_core::{SdpKind, SessionDescription};

/// Re-exports for implementing engines and driving a controller
pub mod prelude {
    pub use crate::capture::{CaptureError, LocalMedia, MediaCapture, MediaConstraints};
    pub use crate::config::ControllerConfig;
    pub use crate::controller::ControllerHandle;
    pub use crate::engine::{EngineError, EngineEvent, EngineEventSink, EngineFactory, NegotiationEngine};
    pub use crate::errors::{Result, SessionError};
    pub use crate::events::{ControllerNotice, ControllerStatus, SessionWarning};
    pub use crate::types::*;
    pub use async_trait::async_trait;
    pub use qrlink_sdp_core::{SdpKind, SessionDescription};
}
