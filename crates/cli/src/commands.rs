//! Operations behind each subcommand, kept free of I/O

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use qrlink_envelope_core::{
    decode_with_recovery, encode_envelope, try_decode, EncodedEnvelope, SCANNABLE_CODE_CAPACITY,
};
use qrlink_sdp_core::{reduce_with_report, MediaSectionSummary, ReducedSdp, SdpKind, SessionDescription};
use qrlink_session_core::ControllerConfig;

pub fn reduce_document(text: &str) -> ReducedSdp {
    reduce_with_report(text)
}

pub fn encode_document(kind: SdpKind, text: &str) -> Result<EncodedEnvelope> {
    let envelope = encode_envelope(&SessionDescription::new(kind, text))
        .with_context(|| format!("Failed to encode {}", kind))?;
    if !envelope.fits_scannable_code() {
        warn!("Token is too long to scan; paste it instead");
    }
    Ok(envelope)
}

pub fn decode_token(token: &str) -> Result<SessionDescription> {
    Ok(try_decode(token)?)
}

/// What a token carries and how large it is
#[derive(Debug, Clone)]
pub struct Inspection {
    pub recovery: &'static str,
    pub received_len: usize,
    pub description: SessionDescription,
    pub sections: Vec<MediaSectionSummary>,
    /// The token re-encoded from the decoded description
    pub canonical: EncodedEnvelope,
}

pub fn inspect_token(token: &str) -> Result<Inspection> {
    let (recovery, description) = decode_with_recovery(token)
        .with_context(|| format!("Could not read code ({} characters)", token.len()))?;
    let sections = reduce_with_report(&description.text).report.sections;
    let canonical = encode_envelope(&description).context("Failed to re-encode description")?;

    Ok(Inspection {
        recovery,
        received_len: token.trim().len(),
        description,
        sections,
        canonical,
    })
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "kind:        {}", self.description.kind)?;
        writeln!(f, "recovery:    {}", self.recovery)?;
        for section in &self.sections {
            writeln!(
                f,
                "media {}:     {} [{}]",
                section.index,
                section.media,
                section.codecs.join(" ")
            )?;
            match &section.candidate {
                Some(candidate) => writeln!(f, "  candidate: {}", candidate)?,
                None => writeln!(f, "  candidate: none")?,
            }
        }
        writeln!(f, "received:    {} chars", self.received_len)?;
        writeln!(
            f,
            "canonical:   {} chars (record {} bytes, deflated {} bytes, ratio {:.2})",
            self.canonical.token.len(),
            self.canonical.record_len,
            self.canonical.compressed_len,
            self.canonical.compression_ratio()
        )?;
        writeln!(
            f,
            "scannable:   {} (capacity {})",
            if self.canonical.fits_scannable_code() { "yes" } else { "no" },
            SCANNABLE_CODE_CAPACITY
        )
    }
}

/// Defaults or `file`, then `QRLINK_*_MS` overrides
pub fn effective_config(file: Option<&Path>) -> Result<ControllerConfig> {
    let config = match file {
        Some(path) => ControllerConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ControllerConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

pub fn render_config(config: &ControllerConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
