//! Negotiation document reducer
//!
//! Strips a full negotiation document down to the lines two peers on the same
//! LAN need to negotiate a direct path:
//!
//! 1. Session-level lines (`v=`, `o=`, `s=`, `t=`, `c=`) are kept verbatim.
//! 2. Every `m=` header is kept and opens a new section.
//! 3. Per-section singletons (ICE credentials, fingerprint, setup role,
//!    rtcp-mux, rtcp, mid, direction) are kept.
//! 4. Every `rtpmap`/`fmtp` line is kept.
//! 5. One candidate per section is kept: the first UDP host candidate on a
//!    private IPv4 address or a non-IPv4 host token.
//! 6. `end-of-candidates` is kept only for sections that kept a candidate.
//! 7. Everything else is dropped.
//!
//! Reduction never fails. Output keeps input order and uses CRLF line
//! terminators.

use tracing::trace;

use crate::candidate::parse_candidate;
use crate::line::{classify_line, LineClass};
use crate::types::SessionDescription;

/// Per-section outcome of a reduction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSectionSummary {
    /// 0-based section index
    pub index: usize,
    /// Media type from the header (`audio`, `video`, `application`)
    pub media: String,
    /// Payload numbers declared on the header
    pub codecs: Vec<String>,
    /// The candidate line retained for this section, if any
    pub candidate: Option<String>,
}

/// Statistics gathered while reducing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReductionReport {
    pub lines_in: usize,
    pub lines_out: usize,
    pub candidates_seen: usize,
    pub candidates_kept: usize,
    pub sections: Vec<MediaSectionSummary>,
}

impl ReductionReport {
    /// Number of media sections in the document
    pub fn media_sections(&self) -> usize {
        self.sections.len()
    }

    /// Number of lines the reduction removed
    pub fn lines_dropped(&self) -> usize {
        self.lines_in - self.lines_out
    }
}

/// Reduced document text together with its report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedSdp {
    pub text: String,
    pub report: ReductionReport,
}

/// Reduce a negotiation document to its minimal form
pub fn reduce(text: &str) -> String {
    reduce_with_report(text).text
}

/// Reduce a description, keeping its kind
pub fn reduce_description(description: &SessionDescription) -> SessionDescription {
    SessionDescription::new(description.kind, reduce(&description.text))
}

/// Reduce a negotiation document and report what was kept
pub fn reduce_with_report(text: &str) -> ReducedSdp {
    let mut report = ReductionReport::default();
    let mut kept: Vec<&str> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        report.lines_in += 1;

        let keep = match classify_line(line) {
            LineClass::Session | LineClass::Singleton | LineClass::Codec => true,
            LineClass::MediaHeader { media, codecs } => {
                let index = report.sections.len();
                trace!("Media section {} ({}) declares codecs {:?}", index, media, codecs);
                report.sections.push(MediaSectionSummary {
                    index,
                    media: media.to_string(),
                    codecs: codecs.iter().map(|c| c.to_string()).collect(),
                    candidate: None,
                });
                true
            }
            LineClass::Candidate(value) => {
                report.candidates_seen += 1;
                match report.sections.last_mut() {
                    Some(section) if section.candidate.is_none() => {
                        let accepted = parse_candidate(value)
                            .map(|candidate| candidate.is_lan_direct())
                            .unwrap_or(false);
                        if accepted {
                            section.candidate = Some(line.to_string());
                            report.candidates_kept += 1;
                        }
                        accepted
                    }
                    _ => false,
                }
            }
            LineClass::EndOfCandidates => report
                .sections
                .last()
                .map_or(false, |section| section.candidate.is_some()),
            LineClass::Other => false,
        };

        if keep {
            kept.push(line);
        }
    }

    report.lines_out = kept.len();

    let mut reduced = kept.join("\r\n");
    if !reduced.is_empty() {
        reduced.push_str("\r\n");
    }

    ReducedSdp {
        text: reduced,
        report,
    }
}

/// The `m=` lines of a document, in order
pub fn media_headers(text: &str) -> Vec<&str> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| line.starts_with("m="))
        .collect()
}

/// Payload numbers declared on an `m=` header
pub fn codec_numbers(header: &str) -> Vec<&str> {
    match classify_line(header) {
        LineClass::MediaHeader { codecs, .. } => codecs,
        _ => Vec::new(),
    }
}
