//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Chain that carries external-ledger anchor attestations on the public
/// network this mirror was built for.
pub const DEFAULT_ANCHOR_CHAIN_ID: &str =
    "df3ade9eec4b08d5379cc64270c30ea7315d8a8a1a69efe2b98a60ecdd69e604";

/// Configuration for one synchronization engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Chain whose entries are decoded as anchor attestations.
    pub anchor_chain_id: String,
    /// Delay between synchronization cycles (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            anchor_chain_id: DEFAULT_ANCHOR_CHAIN_ID.into(),
            poll_interval_ms: 5000,
        }
    }
}
