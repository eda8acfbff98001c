//! chainmirror-core — records, cache tiers, and the query surface.
//!
//! # Architecture
//!
//! ```text
//! LedgerQuery ──┐
//!               ├── BlockCache (typed saves, hash/height/name indexes)
//! SyncEngine ───┘        │
//!                   CacheStore (in-process memo)
//!                        │
//!                   KvBackend  (memory / SQLite)
//! ```

pub mod anchor;
pub mod block_cache;
pub mod cache;
pub mod error;
pub mod progress;
pub mod query;
pub mod types;

pub use anchor::{parse_attestation, AnchorAttestation, AttestationError, ExternalAnchor};
pub use block_cache::BlockCache;
pub use cache::{bucket, CacheStore, KvBackend, MemoryBackend};
pub use error::StoreError;
pub use progress::SyncProgress;
pub use query::{ChainView, LedgerQuery};
pub use types::{
    format_block_time, is_reserved_chain, is_zero_hash, BlockKind, BlockRecord, ChainRegistration,
    ChildRef, DirectoryRecord, EntryAmounts, EntryRecord, HexText, TransferTotals, ADMIN_CHAIN_ID,
    CREDIT_CHAIN_ID, TRANSFER_CHAIN_ID, ZERO_HASH,
};
