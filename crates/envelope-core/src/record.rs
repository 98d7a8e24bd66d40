//! Canonical two-field record
//!
//! The record is compact JSON: `{"type":"offer","sdp":"v=0\r\n..."}`. Reading
//! is deliberately lenient: `kind`/`text` are accepted as field names, the
//! text may itself hold one more serialized record, and escaped line breaks
//! are turned back into real ones.

use serde_json::{Map, Value};

use crate::error::{EnvelopeError, Result};
use qrlink_sdp_core::{SdpKind, SessionDescription};

const KIND_FIELDS: [&str; 2] = ["type", "kind"];
const TEXT_FIELDS: [&str; 2] = ["sdp", "text"];

/// Serialize a description as the canonical record
pub fn to_record(description: &SessionDescription) -> Result<String> {
    serde_json::to_string(description).map_err(|e| EnvelopeError::Serialize(e.to_string()))
}

/// Parse a canonical record, descending at most one nested level
pub fn parse_record(input: &str) -> Option<SessionDescription> {
    let value: Value = serde_json::from_str(input.trim()).ok()?;
    let object = value.as_object()?;

    let kind = kind_of(object);
    let text = field(object, &TEXT_FIELDS)?.as_str()?;

    if text.trim_start().starts_with('{') {
        if let Some(description) = parse_nested(text, kind) {
            return Some(description);
        }
    }

    Some(SessionDescription::new(kind?, unescape_line_breaks(text)))
}

/// The record held in a text field; `None` leaves the outer text as is
fn parse_nested(text: &str, outer_kind: Option<SdpKind>) -> Option<SessionDescription> {
    let nested: Value = serde_json::from_str(text).ok()?;
    let nested = nested.as_object()?;
    let nested_text = field(nested, &TEXT_FIELDS)?.as_str()?;
    let kind = outer_kind.or_else(|| kind_of(nested))?;
    Some(SessionDescription::new(kind, unescape_line_breaks(nested_text)))
}

fn field<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

fn kind_of(object: &Map<String, Value>) -> Option<SdpKind> {
    field(object, &KIND_FIELDS)?.as_str()?.parse().ok()
}

/// Replace literal `\r\n` and `\n` escape sequences with real line breaks
fn unescape_line_breaks(text: &str) -> String {
    if text.contains('\\') {
        text.replace("\\r\\n", "\r\n").replace("\\n", "\n")
    } else {
        text.to_string()
    }
}
