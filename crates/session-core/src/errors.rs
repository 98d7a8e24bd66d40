//! Error types for the negotiation controller

use thiserror::Error;

use crate::capture::CaptureError;
use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::types::NegotiationPhase;
use qrlink_envelope_core::EnvelopeError;
use qrlink_sdp_core::SdpKind;

/// Controller result type
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by the controller
///
/// Fatal errors move the live session to `Failed`; the rest are reported to
/// the caller and leave the phase untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Media capture failed: {0}")]
    Capture(String),

    #[error("Code could not be read: {0}")]
    Decode(String),

    #[error("Expected {expected} code but received {found}")]
    TypeMismatch { expected: SdpKind, found: SdpKind },

    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    #[error("Connection lost: {0}")]
    ConnectivityLost(String),

    #[error("Cannot {operation} while {phase}")]
    InvalidState {
        operation: String,
        phase: NegotiationPhase,
    },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Envelope error: {0}")]
    Envelope(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Controller is not running")]
    ControllerClosed,
}

impl SessionError {
    /// Whether the error ends the live session
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Capture(_)
                | SessionError::Negotiation(_)
                | SessionError::ConnectivityLost(_)
                | SessionError::Engine(_)
                | SessionError::Envelope(_)
        )
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        SessionError::Decode(msg.into())
    }

    pub fn negotiation(msg: impl Into<String>) -> Self {
        SessionError::Negotiation(msg.into())
    }

    pub fn invalid_state(operation: impl Into<String>, phase: NegotiationPhase) -> Self {
        SessionError::InvalidState {
            operation: operation.into(),
            phase,
        }
    }
}

impl From<EnvelopeError> for SessionError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Unreadable { length } => {
                SessionError::Decode(format!("{} characters did not decode", length))
            }
            other => SessionError::Envelope(other.to_string()),
        }
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        SessionError::Engine(err.to_string())
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::Config(err.to_string())
    }
}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        SessionError::Capture(err.to_string())
    }
}
