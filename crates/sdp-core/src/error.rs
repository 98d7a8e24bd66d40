//! Error types for session description handling

use thiserror::Error;

/// Result type alias for session description operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while interpreting negotiation documents
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Candidate attribute could not be parsed
    #[error("Invalid candidate format: {0}")]
    InvalidCandidate(String),

    /// Description kind is neither offer nor answer
    #[error("Unknown description kind: {0}")]
    UnknownKind(String),
}

impl Error {
    /// Create a new invalid candidate error
    pub fn invalid_candidate(details: impl Into<String>) -> Self {
        Self::InvalidCandidate(details.into())
    }
}
