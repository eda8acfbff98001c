//! Decoded record shapes handed back to the classifier.
//!
//! These are already hashed and canonicalized; consumers never re-derive
//! anything from the raw bytes.

/// Sub-record of an admin or credit block.
#[derive(Debug, Clone)]
pub struct DecodedSubRecord {
    pub hash: String,
    /// Short human-readable interpretation of the record.
    pub summary: String,
    pub canonical: String,
    pub raw_hex: String,
}

/// An admin or credit block; both share one shape.
#[derive(Debug, Clone)]
pub struct DecodedSystemBlock {
    pub chain_id: String,
    pub full_hash: String,
    pub partial_hash: String,
    pub prev_hash: String,
    pub height: u64,
    pub canonical: String,
    pub records: Vec<DecodedSubRecord>,
}

/// One transaction inside a transfer block. Amounts are raw unit counts.
#[derive(Debug, Clone)]
pub struct DecodedTransaction {
    pub hash: String,
    pub millis: i64,
    pub inputs: u64,
    pub outputs: u64,
    /// Credits purchased, already converted at the block's exchange rate.
    pub credits: u64,
    pub canonical: String,
    pub raw_hex: String,
}

/// A value-transfer block.
#[derive(Debug, Clone)]
pub struct DecodedTransferBlock {
    pub chain_id: String,
    pub full_hash: String,
    pub partial_hash: String,
    pub prev_hash: String,
    pub height: u64,
    pub exchange_rate: u64,
    pub canonical: String,
    pub transactions: Vec<DecodedTransaction>,
}

/// A generic entry block: entry hashes interleaved with minute markers.
#[derive(Debug, Clone)]
pub struct DecodedEntryBlock {
    pub chain_id: String,
    pub full_hash: String,
    pub partial_hash: String,
    pub prev_hash: String,
    pub height: u64,
    pub canonical: String,
    pub refs: Vec<String>,
}

/// A single entry, fetched by hash.
#[derive(Debug, Clone)]
pub struct DecodedEntry {
    pub hash: String,
    pub chain_id: String,
    pub content: Vec<u8>,
    pub external_ids: Vec<Vec<u8>>,
    pub canonical: String,
}
