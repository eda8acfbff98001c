//! Error types for the cache layer.

use thiserror::Error;

/// Errors that can occur while reading or writing cached records.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Missing {bucket} record: {key}")]
    Missing { bucket: String, key: String },
}
