//! JSON wire format and the production [`WireCodec`].
//!
//! Raw blocks are canonical JSON documents. The full hash (and entry hash)
//! is SHA-256 over the raw bytes; the partial hash is SHA-256 over the
//! serialized header alone, which is what predecessors link to.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec::LedgerCodec;
use crate::error::CodecError;
use crate::records::{
    DecodedEntry, DecodedEntryBlock, DecodedSubRecord, DecodedSystemBlock, DecodedTransaction,
    DecodedTransferBlock,
};

/// Hex-encoded SHA-256.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Minute markers are all-zero hashes except a final byte of 1..=10.
pub fn is_minute_marker(reference: &str) -> bool {
    let Ok(bytes) = hex::decode(reference) else {
        return false;
    };
    if bytes.len() != 32 {
        return false;
    }
    let (head, last) = bytes.split_at(31);
    head.iter().all(|b| *b == 0) && (1..=10).contains(&last[0])
}

// ─── Wire structs ─────────────────────────────────────────────────────────────

/// Common block header; the partial hash is SHA-256 of this, serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireHeader {
    pub chain_id: String,
    pub prev_partial_hash: String,
    pub height: u64,
}

/// Admin and credit blocks share this layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSystemBlock {
    pub header: WireHeader,
    pub records: Vec<WireSystemRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSystemRecord {
    pub kind: String,
    pub detail: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTransferHeader {
    pub chain_id: String,
    pub prev_partial_hash: String,
    pub height: u64,
    /// Units per credit at this height.
    pub exchange_rate: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTransferBlock {
    pub header: WireTransferHeader,
    pub transactions: Vec<WireTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTransaction {
    pub millis: i64,
    pub total_in: u64,
    pub total_out: u64,
    /// Units spent purchasing credits.
    pub total_credit_units: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEntryBlock {
    pub header: WireHeader,
    /// Entry hashes interleaved with minute markers, in minting order.
    pub refs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEntry {
    pub chain_id: String,
    /// Hex-encoded payload.
    pub content: String,
    /// Hex-encoded external ids.
    pub ext_ids: Vec<String>,
}

// ─── Codec implementation ─────────────────────────────────────────────────────

/// The production decoder for the JSON wire format.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireCodec;

impl WireCodec {
    pub fn new() -> Self {
        Self
    }

    fn parse<T: DeserializeOwned>(raw: &[u8], kind: &'static str) -> Result<T, CodecError> {
        serde_json::from_slice(raw).map_err(|e| CodecError::MalformedBlock {
            kind,
            reason: e.to_string(),
        })
    }

    fn decode_system(raw: &[u8], kind: &'static str) -> Result<DecodedSystemBlock, CodecError> {
        let block: WireSystemBlock = Self::parse(raw, kind)?;
        let mut records = Vec::with_capacity(block.records.len());
        for record in &block.records {
            let bytes = serde_json::to_vec(record)?;
            records.push(DecodedSubRecord {
                hash: sha256_hex(&bytes),
                summary: format!("{} {}", record.kind, record.detail),
                canonical: serde_json::to_string(record)?,
                raw_hex: hex::encode(&bytes),
            });
        }
        Ok(DecodedSystemBlock {
            chain_id: block.header.chain_id.clone(),
            full_hash: sha256_hex(raw),
            partial_hash: sha256_hex(&serde_json::to_vec(&block.header)?),
            prev_hash: block.header.prev_partial_hash.clone(),
            height: block.header.height,
            canonical: serde_json::to_string(&block)?,
            records,
        })
    }
}

impl LedgerCodec for WireCodec {
    fn decode_admin_block(&self, raw: &[u8]) -> Result<DecodedSystemBlock, CodecError> {
        Self::decode_system(raw, "admin")
    }

    fn decode_credit_block(&self, raw: &[u8]) -> Result<DecodedSystemBlock, CodecError> {
        Self::decode_system(raw, "credit")
    }

    fn decode_transfer_block(&self, raw: &[u8]) -> Result<DecodedTransferBlock, CodecError> {
        let block: WireTransferBlock = Self::parse(raw, "transfer")?;
        let rate = block.header.exchange_rate;
        let mut transactions = Vec::with_capacity(block.transactions.len());
        for tx in &block.transactions {
            let bytes = serde_json::to_vec(tx)?;
            transactions.push(DecodedTransaction {
                hash: sha256_hex(&bytes),
                millis: tx.millis,
                inputs: tx.total_in,
                outputs: tx.total_out,
                credits: tx.total_credit_units.checked_div(rate).unwrap_or(0),
                canonical: serde_json::to_string(tx)?,
                raw_hex: hex::encode(&bytes),
            });
        }
        Ok(DecodedTransferBlock {
            chain_id: block.header.chain_id.clone(),
            full_hash: sha256_hex(raw),
            partial_hash: sha256_hex(&serde_json::to_vec(&block.header)?),
            prev_hash: block.header.prev_partial_hash.clone(),
            height: block.header.height,
            exchange_rate: rate,
            canonical: serde_json::to_string(&block)?,
            transactions,
        })
    }

    fn decode_entry_block(&self, raw: &[u8]) -> Result<DecodedEntryBlock, CodecError> {
        let block: WireEntryBlock = Self::parse(raw, "entry")?;
        Ok(DecodedEntryBlock {
            chain_id: block.header.chain_id.clone(),
            full_hash: sha256_hex(raw),
            partial_hash: sha256_hex(&serde_json::to_vec(&block.header)?),
            prev_hash: block.header.prev_partial_hash.clone(),
            height: block.header.height,
            canonical: serde_json::to_string(&block)?,
            refs: block.refs,
        })
    }

    fn decode_entry(&self, raw: &[u8]) -> Result<DecodedEntry, CodecError> {
        let entry: WireEntry =
            serde_json::from_slice(raw).map_err(|e| CodecError::MalformedEntry {
                reason: e.to_string(),
            })?;
        let content = hex::decode(&entry.content)?;
        let mut external_ids = Vec::with_capacity(entry.ext_ids.len());
        for ext in &entry.ext_ids {
            external_ids.push(hex::decode(ext)?);
        }
        Ok(DecodedEntry {
            hash: sha256_hex(raw),
            chain_id: entry.chain_id.clone(),
            content,
            external_ids,
            canonical: serde_json::to_string(&entry)?,
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
