//! Error types for the envelope codec

use thiserror::Error;

/// Result type alias for envelope operations
pub type Result<T> = std::result::Result<T, EnvelopeError>;

/// Errors raised while building or reading envelopes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The canonical record could not be serialized
    #[error("Failed to serialize record: {0}")]
    Serialize(String),

    /// The compression transform failed
    #[error("Failed to compress record: {0}")]
    Compress(String),

    /// No decoding strategy produced a description
    #[error("Could not read code ({length} characters)")]
    Unreadable { length: usize },
}
