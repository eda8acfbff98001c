//! Error types for the decode pipeline.

use thiserror::Error;

/// Errors that can occur while decoding raw ledger records.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed {kind} block: {reason}")]
    MalformedBlock { kind: &'static str, reason: String },

    #[error("Malformed entry: {reason}")]
    MalformedEntry { reason: String },

    #[error("Bad hex payload: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Bad money string '{value}': {reason}")]
    Money { value: String, reason: String },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
