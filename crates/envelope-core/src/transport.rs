//! Recovery of tokens altered in transit
//!
//! A token can reach the decoder in several shapes depending on the path it
//! took: untouched, transcribed as decimal byte values by a camera reader,
//! percent-escaped by a URL-aware clipboard, or wrapped in standard base64 by
//! a naive intermediary. Each recovery is a pure function producing a
//! candidate string; they are tried in a fixed order.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// A recovery turning a received token into a candidate string
pub(crate) type Recovery = fn(&str) -> Option<String>;

/// Recoveries in the order their candidates are tried
pub(crate) static RECOVERIES: [(&str, Recovery); 4] = [
    ("verbatim", verbatim),
    ("byte-sequence", from_byte_sequence),
    ("percent-escapes", from_percent_escapes),
    ("standard-base64", from_standard_base64),
];

/// Candidate strings for a token, lazily, labelled with their recovery
pub(crate) fn candidates(token: &str) -> impl Iterator<Item = (&'static str, String)> + '_ {
    RECOVERIES
        .iter()
        .filter_map(move |(name, recover)| recover(token).map(|candidate| (*name, candidate)))
}

fn verbatim(token: &str) -> Option<String> {
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn from_byte_sequence(token: &str) -> Option<String> {
    let bytes = token
        .split_whitespace()
        .map(|part| part.parse::<u8>().ok())
        .collect::<Option<Vec<u8>>>()?;
    if bytes.is_empty() {
        return None;
    }
    String::from_utf8(bytes).ok()
}

fn from_percent_escapes(token: &str) -> Option<String> {
    if !has_percent_escape(token) {
        return None;
    }
    urlencoding::decode(token.trim()).ok().map(Cow::into_owned)
}

fn from_standard_base64(token: &str) -> Option<String> {
    let token = token.trim();
    let charset_valid = token
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='));
    if token.is_empty() || !charset_valid || token.len() % 4 != 0 {
        return None;
    }
    let bytes = STANDARD.decode(token).ok()?;
    String::from_utf8(bytes).ok()
}

fn has_percent_escape(token: &str) -> bool {
    token
        .as_bytes()
        .windows(3)
        .any(|w| w[0] == b'%' && w[1].is_ascii_hexdigit() && w[2].is_ascii_hexdigit())
}

/// Percent-escape a token the way a URL-aware clipboard would
pub fn percent_encode(token: &str) -> String {
    urlencoding::encode(token).into_owned()
}

/// Render a token as whitespace-separated decimal byte values
pub fn byte_sequence(token: &str) -> String {
    token
        .bytes()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wrap a token in standard base64
pub fn rewrap_base64(token: &str) -> String {
    STANDARD.encode(token.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(token: &str) -> Vec<&'static str> {
        candidates(token).map(|(name, _)| name).collect()
    }

    #[test]
    fn test_byte_sequence_recovery() {
        assert_eq!(from_byte_sequence("104 105"), Some("hi".to_string()));
        assert_eq!(from_byte_sequence(" 104\n105\t"), Some("hi".to_string()));
        assert_eq!(from_byte_sequence("104 256"), None);
        assert_eq!(from_byte_sequence("104 x"), None);
        assert_eq!(from_byte_sequence("   "), None);
        assert_eq!(from_byte_sequence(&byte_sequence("héllo")), Some("héllo".to_string()));
    }

    #[test]
    fn test_percent_recovery() {
        assert_eq!(from_percent_escapes("a%2Bb"), Some("a+b".to_string()));
        assert_eq!(from_percent_escapes("100%"), None);
        assert_eq!(from_percent_escapes("plain"), None);
        assert_eq!(
            from_percent_escapes(&percent_encode(r#"{"type":"offer"}"#)),
            Some(r#"{"type":"offer"}"#.to_string())
        );
    }

    #[test]
    fn test_standard_base64_recovery() {
        assert_eq!(from_standard_base64(&rewrap_base64("token-1_x")), Some("token-1_x".to_string()));
        assert_eq!(from_standard_base64("abc"), None);
        assert_eq!(from_standard_base64("ab-_"), None);
    }

    #[test]
    fn test_candidate_order() {
        assert_eq!(labels("aGk="), vec!["verbatim", "standard-base64"]);
        assert_eq!(labels("abcd"), vec!["verbatim"]);
        assert_eq!(labels("104 105"), vec!["verbatim", "byte-sequence"]);
        assert_eq!(labels("a%20b"), vec!["verbatim", "percent-escapes"]);
        assert!(labels("  ").is_empty());
    }
}
