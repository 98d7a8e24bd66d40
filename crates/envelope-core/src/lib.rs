//! Envelope codec for offer/answer descriptions.
//!
//! Turns a [`SessionDescription`] into a short printable token that fits a
//! scannable code, and turns tokens back into descriptions even after they
//! have been mangled in transit.
//!
//! Encoding pipeline:
//!
//! 1. reduce the document ([`qrlink_sdp_core::reduce`])
//! 2. serialize the canonical record `{"type":..,"sdp":..}`
//! 3. raw DEFLATE
//! 4. URL-safe base64 without padding
//!
//! Decoding derives candidate strings from the token (verbatim, a
//! whitespace-separated byte sequence, percent-escapes, standard base64) and
//! returns the first one that yields a record, either through the compression
//! transform or as a plain record.
//!
//! # Example
//!
//! ```
//! use qrlink_envelope_core::{decode, encode, percent_encode};
//! use qrlink_sdp_core::{SdpKind, SessionDescription};
//!
//! let offer = SessionDescription::offer("v=0\r\ns=-\r\nt=0 0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 0\r\na=rtpmap:0 PCMU/8000\r\n");
//! let token = encode(&offer).unwrap();
//!
//! let decoded = decode(&percent_encode(&token)).unwrap();
//! assert_eq!(decoded.kind, SdpKind::Offer);
//! assert_eq!(decoded.media_headers(), vec!["m=audio 9 UDP/TLS/RTP/SAVPF 0"]);
//! ```

pub mod codec;
pub mod compression;
pub mod error;
pub mod record;
pub mod transport;

pub use codec::{
    decode, decode_with_recovery, encode, encode_envelope, try_decode, EncodedEnvelope,
    SCANNABLE_CODE_CAPACITY,
};
pub use error::{EnvelopeError, Result};
pub use record::{parse_record, to_record};
pub use transport::{byte_sequence, percent_encode, rewrap_base64};

pub use qrlink_sdp_core::{SdpKind, SessionDescription};
