//! Error types for remote node calls.

use thiserror::Error;

/// Errors that can occur while talking to the remote node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Connection-level failure (refused, timeout, TLS, bad transport).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-2xx response from the node.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The node answered but reported failure in its response envelope.
    #[error("Node API error: {0}")]
    Api(String),

    /// Response payload could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Raw payload was not valid hex.
    #[error("Bad hex payload: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl NodeError {
    /// Returns `true` if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
