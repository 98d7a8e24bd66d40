//! Reversible text compression into a printable alphabet
//!
//! Raw DEFLATE at best compression, then URL-safe base64 without padding. The
//! alphabet survives URLs, clipboards and a code's byte mode unchanged.

use std::io::{Read, Write};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{EnvelopeError, Result};

/// Upper bound on inflated output; a negotiation record is a few kilobytes.
const MAX_INFLATED_LEN: u64 = 1 << 20;

/// Token alphabet: URL-safe, unpadded on encode, padding-tolerant on decode
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Compressed form of a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    /// Printable token
    pub token: String,
    /// Length of the deflated bytes before alphabet encoding
    pub deflated_len: usize,
}

/// Compress text into a printable token
pub fn compress(text: &str) -> Result<Compressed> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| EnvelopeError::Compress(e.to_string()))?;
    let deflated = encoder
        .finish()
        .map_err(|e| EnvelopeError::Compress(e.to_string()))?;

    Ok(Compressed {
        token: TOKEN_ENGINE.encode(&deflated),
        deflated_len: deflated.len(),
    })
}

/// Reverse [`compress`]; `None` when the input is not a compressed token
pub fn decompress(token: &str) -> Option<String> {
    let deflated = TOKEN_ENGINE.decode(token.trim()).ok()?;
    let mut text = String::new();
    DeflateDecoder::new(deflated.as_slice())
        .take(MAX_INFLATED_LEN)
        .read_to_string(&mut text)
        .ok()?;
    Some(text)
}
