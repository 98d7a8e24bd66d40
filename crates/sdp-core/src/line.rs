//! SDP line classification
//!
//! Each SDP line has the format `<type>=<value>` where type is a single
//! character. The reducer only cares about a handful of line types and
//! attribute names, so instead of building a full document tree every line is
//! classified by prefix, in the priority order the reduction rules are
//! written in.

/// Session-level line types kept verbatim: version, origin, session name,
/// timing and connection.
const SESSION_LINE_TYPES: [char; 5] = ['v', 'o', 's', 't', 'c'];

/// Attributes that occur at most once per media section and are needed for
/// the transport to come up.
const SECTION_SINGLETONS: [&str; 11] = [
    "ice-ufrag",
    "ice-pwd",
    "fingerprint",
    "setup",
    "rtcp-mux",
    "rtcp",
    "mid",
    "sendrecv",
    "sendonly",
    "recvonly",
    "inactive",
];

/// Attributes describing codecs; every one of them is required.
const CODEC_ATTRIBUTES: [&str; 2] = ["rtpmap", "fmtp"];

/// What a line is, as far as reduction is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// `v=`, `o=`, `s=`, `t=` or `c=`
    Session,
    /// `m=` header with the payload numbers it declares
    MediaHeader {
        media: &'a str,
        codecs: Vec<&'a str>,
    },
    /// Per-section singleton attribute
    Singleton,
    /// `a=rtpmap:` or `a=fmtp:`
    Codec,
    /// `a=candidate:` with the attribute value
    Candidate(&'a str),
    /// `a=end-of-candidates`
    EndOfCandidates,
    /// Anything else
    Other,
}

/// Classify a single line (without its terminator)
pub fn classify_line(line: &str) -> LineClass<'_> {
    let mut chars = line.chars();
    let (Some(line_type), Some('=')) = (chars.next(), chars.next()) else {
        return LineClass::Other;
    };
    let value = &line[line_type.len_utf8() + 1..];

    if SESSION_LINE_TYPES.contains(&line_type) {
        return LineClass::Session;
    }

    match line_type {
        'm' => {
            let mut fields = value.split_whitespace();
            let media = fields.next().unwrap_or_default();
            // Skip port and transport protocol.
            let codecs = fields.skip(2).collect();
            LineClass::MediaHeader { media, codecs }
        }
        'a' => classify_attribute(value),
        _ => LineClass::Other,
    }
}

fn classify_attribute(value: &str) -> LineClass<'_> {
    let (name, attr_value) = match value.split_once(':') {
        Some((name, rest)) => (name, rest),
        None => (value, ""),
    };

    if SECTION_SINGLETONS.contains(&name) {
        LineClass::Singleton
    } else if CODEC_ATTRIBUTES.contains(&name) {
        LineClass::Codec
    } else if name == "candidate" {
        LineClass::Candidate(attr_value)
    } else if name == "end-of-candidates" {
        LineClass::EndOfCandidates
    } else {
        LineClass::Other
    }
}
