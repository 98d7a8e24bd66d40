//! # qrlink
//!
//! Lets two devices on the same network set up a direct audio/video call
//! without a signaling server. The offer and the answer travel between the
//! devices as scannable codes or pasted text.
//!
//! - [`sdp_core`]: description model and the size reducer
//! - [`envelope_core`]: token encoding and tolerant decoding
//! - [`session_core`]: the negotiation controller
//!
//! ```
//! use qrlink::prelude::*;
//!
//! let offer = SessionDescription::offer("v=0\r\ns=-\r\nt=0 0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 0\r\n");
//! let token = encode(&offer).unwrap();
//! assert_eq!(decode(&token).map(|d| d.kind), Some(SdpKind::Offer));
//! ```

#![warn(rust_2018_idioms)]

pub use qrlink_envelope_core as envelope_core;
pub use qrlink_sdp_core as sdp_core;
pub use qrlink_session_core as session_core;

/// Common imports for qrlink applications
pub mod prelude {
    pub use crate::envelope_core::{decode, encode, encode_envelope, EncodedEnvelope};
    pub use crate::sdp_core::{reduce, reduce_description, ReductionReport};
    pub use crate::session_core::prelude::*;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
