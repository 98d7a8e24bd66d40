//! Session description model and size reducer.
//!
//! A negotiation document produced by a browser-grade engine is usually far
//! larger than a scannable code can carry: it advertises every candidate the
//! device could gather, header extensions, simulcast identifiers and other
//! attributes that a two-peer LAN call never uses. This crate provides:
//!
//! - [`SessionDescription`] / [`SdpKind`]: the offer/answer data model
//! - [`parse_candidate`]: an ICE candidate line parser
//! - [`classify_line`]: the prefix classifier the reducer is driven by
//! - [`reduce`]: the pure, total reduction of a document to its minimal form
//!
//! # Example
//!
//! ```
//! use qrlink_sdp_core::reduce;
//!
//! let sdp = "v=0\r\n\
//!            o=- 1 2 IN IP4 127.0.0.1\r\n\
//!            s=-\r\n\
//!            t=0 0\r\n\
//!            m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
//!            a=rtpmap:111 opus/48000/2\r\n\
//!            a=extmap:1 urn:ietf:params:rtp-hdrext:ssrc-audio-level\r\n\
//!            a=candidate:1 1 udp 2122260223 192.168.1.20 50000 typ host\r\n\
//!            a=candidate:2 1 udp 1686052607 203.0.113.9 50000 typ srflx raddr 192.168.1.20 rport 50000\r\n";
//!
//! let reduced = reduce(sdp);
//! assert!(reduced.contains("a=rtpmap:111 opus/48000/2"));
//! assert!(!reduced.contains("extmap"));
//! assert_eq!(reduced.matches("a=candidate:").count(), 1);
//! ```

pub mod candidate;
pub mod error;
pub mod line;
pub mod reducer;
pub mod types;

pub use candidate::{parse_candidate, CandidateLine, CandidateType, TransportType};
pub use error::{Error, Result};
pub use line::{classify_line, LineClass};
pub use reducer::{
    codec_numbers, media_headers, reduce, reduce_description, reduce_with_report,
    MediaSectionSummary, ReducedSdp, ReductionReport,
};
pub use types::{SdpKind, SessionDescription};

/// Re-export of common types and functions
pub mod prelude {
    pub use super::{
        reduce, reduce_description, reduce_with_report, Error, ReducedSdp, ReductionReport,
        Result, SdpKind, SessionDescription,
    };
}
