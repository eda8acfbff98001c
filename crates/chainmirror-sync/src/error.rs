//! Error type for the synchronization engine.

use chainmirror_codec::CodecError;
use chainmirror_core::StoreError;
use chainmirror_node::NodeError;
use thiserror::Error;

/// Anything that can abort a synchronization pass.
///
/// Node errors may be transient and worth retrying on the next cycle;
/// store errors mean the durable cache can no longer be trusted and are
/// fatal to the run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("node request failed: {0}")]
    Node(#[from] NodeError),

    #[error("could not decode {hash}: {source}")]
    Decode {
        hash: String,
        #[source]
        source: CodecError,
    },

    #[error("cache store failed: {0}")]
    Store(#[from] StoreError),

    /// A record a pass depends on is absent from the cache.
    #[error("missing {what} {hash}")]
    Missing { what: &'static str, hash: String },

    /// No directory record persisted at a height the tally pass expected.
    #[error("no directory block at height {height}")]
    MissingHeight { height: u64 },

    /// The stop signal was raised between height iterations.
    #[error("synchronization stopped by request")]
    Stopped,
}

impl SyncError {
    /// `true` when retrying the same unit on the next cycle may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Node(err) => err.is_transient(),
            _ => false,
        }
    }
}
