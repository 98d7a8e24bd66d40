//! Offer/answer data model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which half of the handshake a description belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    /// Sent by the initiating peer
    Offer,
    /// Sent back by the receiving peer
    Answer,
}

impl SdpKind {
    /// Wire spelling of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
        }
    }
}

impl fmt::Display for SdpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SdpKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offer" => Ok(Self::Offer),
            "answer" => Ok(Self::Answer),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

/// A negotiation document together with its role in the handshake
///
/// Serializes as `{"type":"offer","sdp":"..."}`, the same shape engines use
/// for their own description objects, so hand-pasted engine output decodes
/// without any envelope around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Offer or answer
    #[serde(rename = "type")]
    pub kind: SdpKind,

    /// The multi-line document
    #[serde(rename = "sdp")]
    pub text: String,
}

impl SessionDescription {
    /// Create a new description
    pub fn new(kind: SdpKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Create an offer
    pub fn offer(text: impl Into<String>) -> Self {
        Self::new(SdpKind::Offer, text)
    }

    /// Create an answer
    pub fn answer(text: impl Into<String>) -> Self {
        Self::new(SdpKind::Answer, text)
    }

    /// The `m=` lines of the document, in order
    pub fn media_headers(&self) -> Vec<&str> {
        crate::reducer::media_headers(&self.text)
    }
}
