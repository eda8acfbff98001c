//! Shared record types persisted by the mirror.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All-zero hash marking "no predecessor" (chain and ledger genesis).
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Reserved chain id of the admin block chain.
pub const ADMIN_CHAIN_ID: &str =
    "000000000000000000000000000000000000000000000000000000000000000a";

/// Reserved chain id of the entry-credit block chain.
pub const CREDIT_CHAIN_ID: &str =
    "000000000000000000000000000000000000000000000000000000000000000c";

/// Reserved chain id of the value-transfer block chain.
pub const TRANSFER_CHAIN_ID: &str =
    "000000000000000000000000000000000000000000000000000000000000000f";

/// Returns `true` for the all-zero genesis sentinel.
pub fn is_zero_hash(hash: &str) -> bool {
    hash == ZERO_HASH
}

/// Returns `true` for the three reserved system chain ids.
pub fn is_reserved_chain(chain_id: &str) -> bool {
    matches!(chain_id, ADMIN_CHAIN_ID | CREDIT_CHAIN_ID | TRANSFER_CHAIN_ID)
}

/// Formats a unix timestamp the way records store block times.
pub fn format_block_time(secs: i64) -> String {
    let when = DateTime::from_timestamp(secs, 0).unwrap_or_default();
    when.format("%Y-%m-%d %H:%M:%S").to_string()
}

// ─── BlockKind ────────────────────────────────────────────────────────────────

/// Closed set of block types; every stored block carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Admin,
    Credit,
    Transfer,
    Entry,
}

impl BlockKind {
    /// Selects the decode path for a chain id.
    pub fn for_chain(chain_id: &str) -> Self {
        match chain_id {
            ADMIN_CHAIN_ID => Self::Admin,
            CREDIT_CHAIN_ID => Self::Credit,
            TRANSFER_CHAIN_ID => Self::Transfer,
            _ => Self::Entry,
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Admin => "admin",
            Self::Credit => "credit",
            Self::Transfer => "transfer",
            Self::Entry => "entry",
        };
        write!(f, "{name}")
    }
}

// ─── HexText ──────────────────────────────────────────────────────────────────

/// Byte payload kept in both hex and lossy-decoded text form.
///
/// The text form feeds the name indexes and substring search; the hex form
/// stays faithful to the wire bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexText {
    pub hex: String,
    pub text: String,
}

impl HexText {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            hex: hex::encode(bytes),
            text: String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

// ─── ChildRef ─────────────────────────────────────────────────────────────────

/// Reference to one chain's block at a given directory height.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    pub chain_id: String,
    pub hash: String,
}

// ─── DirectoryRecord ──────────────────────────────────────────────────────────

/// One record per ledger height, listing every chain block minted there.
///
/// Created once during the fetch pass; `next_hash`, `tally` and the anchor
/// fields are filled in by later passes. Never deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Primary key; the hash the remote node links by.
    pub hash: String,
    pub full_hash: String,
    pub prev_hash: String,
    /// Set by the link pass once the successor is known.
    pub next_hash: Option<String>,
    pub sequence: u64,
    pub timestamp: i64,
    pub block_time: String,
    /// Non-reserved chains minted at this height.
    pub child_blocks: Vec<ChildRef>,
    pub admin_block: ChildRef,
    pub credit_block: ChildRef,
    pub transfer_block: ChildRef,
    pub admin_entries: u64,
    pub credit_entries: u64,
    pub transfer_entries: u64,
    pub entry_entries: u64,
    /// Cumulative supply tally, set by the tally pass.
    pub tally: Option<String>,
    pub anchor_tx: Option<String>,
    pub anchor_entry: Option<String>,
}

// ─── BlockRecord ──────────────────────────────────────────────────────────────

/// One chain's block at one height, stored under its partial hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    pub chain_id: String,
    pub full_hash: String,
    /// Primary key; predecessors link to this.
    pub partial_hash: String,
    pub prev_hash: String,
    pub next_hash: Option<String>,
    pub kind: BlockKind,
    pub entry_count: u64,
    pub entry_ids: Vec<String>,
    /// Loaded on demand; persisted individually, not with the block.
    #[serde(skip)]
    pub entries: Vec<EntryRecord>,
    pub canonical: String,
    pub raw: String,
    pub timestamp: String,
    /// Issuance aggregates, present on transfer blocks only.
    pub totals: Option<TransferTotals>,
}

/// Block-level monetary aggregates, 8-decimal fixed-point strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTotals {
    pub inputs: String,
    pub outputs: String,
    pub credits: String,
    pub created: String,
    pub destroyed: String,
    pub net_delta: String,
}

// ─── EntryRecord ──────────────────────────────────────────────────────────────

/// A single chain entry (or transaction row, for system blocks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    pub chain_id: String,
    /// Primary key.
    pub hash: String,
    pub timestamp: String,
    pub canonical: String,
    pub raw: String,
    /// Short human-readable rendering, when the kind has one.
    pub summary: Option<String>,
    pub content: Option<HexText>,
    pub external_ids: Vec<HexText>,
    /// Minute the entry was minted in, backfilled from marker rows.
    pub minute_marker: Option<String>,
    /// Parsed anchor attestation; re-derived on load, never persisted.
    #[serde(skip)]
    pub attestation: Option<crate::anchor::AnchorAttestation>,
    /// Per-transaction amounts, present on transfer block rows only.
    pub amounts: Option<EntryAmounts>,
}

/// Per-transaction monetary figures, 8-decimal fixed-point strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryAmounts {
    pub inputs: String,
    pub outputs: String,
    pub credits: String,
    pub delta: String,
}

// ─── ChainRegistration ────────────────────────────────────────────────────────

/// Name record minted when a chain's genesis block is first stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRegistration {
    pub chain_id: String,
    /// The genesis entry's external IDs, used as the chain's names.
    pub names: Vec<HexText>,
    pub first_entry_id: String,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
