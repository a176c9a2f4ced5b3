//! Protocol error type.

use thiserror::Error;

/// Errors from protocol and round operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid range: max ({max}) must be greater than min ({min})")]
    InvalidRange { min: i64, max: i64 },

    #[error("Invalid contribution {value}: expected an integer in {min}..={max}")]
    InvalidContribution { value: i64, min: i64, max: i64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Verification failed: MAC {mac} does not match revealed value {value}")]
    VerificationFailure { value: i64, mac: String },

    #[error("Round aborted by peer")]
    AbortedByPeer,

    #[error("Cryptographic primitive unavailable: {0}")]
    CryptoUnavailable(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Transcript mismatch: {0}")]
    TranscriptMismatch(String),

    #[error("Malformed transcript: {0}")]
    Transcript(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Errors the caller may recover from by asking the peer again
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProtocolError::InvalidContribution { .. })
    }
}
