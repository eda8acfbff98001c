//! Persisted synchronization progress.

use crate::types::ZERO_HASH;
use serde::{Deserialize, Serialize};

/// Schema version written into every progress record.
pub const PROGRESS_VERSION: u32 = 1;

/// The mirror's single progress record.
///
/// Threaded explicitly through each pass and persisted after every unit of
/// work, so a crash loses at most one unit. Each field is owned by exactly
/// one pass: the fetch pass owns the `known`/fetch fields, the link pass the
/// `processed`/link fields, the tally pass `last_tallied_height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub version: u32,
    /// Highest contiguous height fully fetched.
    pub known_height: u64,
    /// Frontier of the fetch pass; zero hash until the first walk completes.
    pub last_known_block: String,
    /// Frontier of the link pass.
    pub last_processed_block: String,
    /// Height through which balances are tallied; `None` = nothing tallied.
    pub last_tallied_height: Option<u64>,
    /// Head captured when the current fetch walk started.
    pub next_head: Option<String>,
    /// Mid-walk resume cursor for the fetch pass.
    pub resume_fetch_from: Option<String>,
    /// Mid-walk resume cursor for the link pass.
    pub resume_link_from: Option<String>,
    /// Head captured when the current link walk started.
    pub next_linked_head: Option<String>,
}

impl Default for SyncProgress {
    fn default() -> Self {
        Self {
            version: PROGRESS_VERSION,
            known_height: 0,
            last_known_block: ZERO_HASH.to_string(),
            last_processed_block: ZERO_HASH.to_string(),
            last_tallied_height: None,
            next_head: None,
            resume_fetch_from: None,
            resume_link_from: None,
            next_linked_head: None,
        }
    }
}

impl SyncProgress {
    /// `true` until the first fetch walk has completed.
    pub fn is_empty(&self) -> bool {
        self.last_known_block == ZERO_HASH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let p = SyncProgress::default();
        assert!(p.is_empty());
        assert_eq!(p.version, PROGRESS_VERSION);
        assert_eq!(p.known_height, 0);
        assert!(p.last_tallied_height.is_none());
    }

    #[test]
    fn survives_json_round_trip() {
        let mut p = SyncProgress::default();
        p.known_height = 7;
        p.resume_fetch_from = Some("ab".repeat(32));
        let back: SyncProgress =
            serde_json::from_slice(&serde_json::to_vec(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }
}
