//! Token encode/decode

use tracing::{debug, warn};

use crate::compression::{compress, decompress};
use crate::error::{EnvelopeError, Result};
use crate::record::{parse_record, to_record};
use crate::transport::candidates;
use qrlink_sdp_core::{reduce_description, SessionDescription};

/// Byte capacity of the largest scannable code at moderate error correction
pub const SCANNABLE_CODE_CAPACITY: usize = 2331;

/// A token together with the sizes that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedEnvelope {
    /// Printable token
    pub token: String,
    /// Length of the serialized record before compression
    pub record_len: usize,
    /// Length of the compressed bytes before alphabet encoding
    pub compressed_len: usize,
}

impl EncodedEnvelope {
    /// Record length divided by token length
    pub fn compression_ratio(&self) -> f64 {
        if self.token.is_empty() {
            return 0.0;
        }
        self.record_len as f64 / self.token.len() as f64
    }

    /// Whether the token fits a moderate error correction code
    pub fn fits_scannable_code(&self) -> bool {
        self.token.len() <= SCANNABLE_CODE_CAPACITY
    }
}

/// Encode a description into a token
pub fn encode(description: &SessionDescription) -> Result<String> {
    encode_envelope(description).map(|envelope| envelope.token)
}

/// Encode a description, keeping size information
pub fn encode_envelope(description: &SessionDescription) -> Result<EncodedEnvelope> {
    let reduced = reduce_description(description);
    let record = to_record(&reduced)?;
    let compressed = compress(&record)?;

    let envelope = EncodedEnvelope {
        token: compressed.token,
        record_len: record.len(),
        compressed_len: compressed.deflated_len,
    };

    debug!(
        "Encoded {} ({} -> {} bytes, token {} chars, ratio {:.2})",
        description.kind,
        description.text.len(),
        envelope.record_len,
        envelope.token.len(),
        envelope.compression_ratio()
    );
    if !envelope.fits_scannable_code() {
        warn!(
            "Token of {} chars exceeds scannable code capacity of {}",
            envelope.token.len(),
            SCANNABLE_CODE_CAPACITY
        );
    }

    Ok(envelope)
}

/// Decode a token, trying every recovery in order
///
/// Returns `None` when no recovery yields a record with a recognized kind and
/// a text; callers surface that as an unreadable code.
pub fn decode(token: &str) -> Option<SessionDescription> {
    decode_with_recovery(token).map(|(_, description)| description)
}

/// Decode a token and name the recovery that produced the description
pub fn decode_with_recovery(token: &str) -> Option<(&'static str, SessionDescription)> {
    let decoded = candidates(token).find_map(|(recovery, candidate)| {
        decode_candidate(&candidate).map(|description| (recovery, description))
    });

    match &decoded {
        Some((recovery, description)) => {
            debug!("Decoded {} via {} recovery", description.kind, recovery);
        }
        None => {
            debug!("No recovery produced a description from {} chars", token.len());
        }
    }
    decoded
}

/// Like [`decode`] but reporting failure as an error
pub fn try_decode(token: &str) -> Result<SessionDescription> {
    decode(token).ok_or(EnvelopeError::Unreadable {
        length: token.len(),
    })
}

fn decode_candidate(candidate: &str) -> Option<SessionDescription> {
    decompress(candidate)
        .and_then(|record| parse_record(&record))
        .or_else(|| parse_record(candidate))
}
