//! Block classification: decode one chain's block at one height and
//! normalize it into the shared record shape.

use chainmirror_codec::money::format_units;
use chainmirror_codec::records::{DecodedEntryBlock, DecodedSystemBlock, DecodedTransferBlock};
use chainmirror_codec::wire::is_minute_marker;
use chainmirror_core::types::{
    format_block_time, BlockKind, BlockRecord, ChildRef, DirectoryRecord, EntryAmounts,
    EntryRecord, HexText, TransferTotals,
};
use chainmirror_node::LedgerClient;

use crate::error::SyncError;
use crate::SyncEngine;

impl<C: LedgerClient> SyncEngine<C> {
    /// Fetches, decodes and persists the block `child` points at, recording
    /// its reference and entry count on the directory record.
    ///
    /// The chain id selects the decode path: the three reserved system
    /// chains each have their own, everything else is a generic entry
    /// block. A decode failure aborts before anything is cached, so no
    /// partial block can be observed on resume.
    pub(crate) async fn fetch_block(
        &self,
        child: &ChildRef,
        dir: &mut DirectoryRecord,
    ) -> Result<(), SyncError> {
        let raw = self.client.raw_data(&child.hash).await?;

        match BlockKind::for_chain(&child.chain_id) {
            BlockKind::Admin => {
                let decoded = self.codec.decode_admin_block(&raw).map_err(|source| {
                    SyncError::Decode { hash: child.hash.clone(), source }
                })?;
                let mut block = system_block_record(BlockKind::Admin, &decoded, &raw, dir);
                self.cache.save_block(&mut block).await?;
                dir.admin_entries = block.entry_count;
                dir.admin_block = ChildRef {
                    chain_id: block.chain_id,
                    hash: block.partial_hash,
                };
            }
            BlockKind::Credit => {
                let decoded = self.codec.decode_credit_block(&raw).map_err(|source| {
                    SyncError::Decode { hash: child.hash.clone(), source }
                })?;
                let mut block = system_block_record(BlockKind::Credit, &decoded, &raw, dir);
                self.cache.save_block(&mut block).await?;
                dir.credit_entries = block.entry_count;
                dir.credit_block = ChildRef {
                    chain_id: block.chain_id,
                    hash: block.partial_hash,
                };
            }
            BlockKind::Transfer => {
                let decoded = self.codec.decode_transfer_block(&raw).map_err(|source| {
                    SyncError::Decode { hash: child.hash.clone(), source }
                })?;
                let mut block = transfer_block_record(&decoded, &raw, dir);
                self.cache.save_block(&mut block).await?;
                dir.transfer_entries = block.entry_count;
                dir.transfer_block = ChildRef {
                    chain_id: block.chain_id,
                    hash: block.partial_hash,
                };
            }
            BlockKind::Entry => {
                let decoded = self.codec.decode_entry_block(&raw).map_err(|source| {
                    SyncError::Decode { hash: child.hash.clone(), source }
                })?;
                let mut block = self.entry_block_record(&decoded, &raw, dir).await?;
                self.cache.save_block(&mut block).await?;
                dir.entry_entries += block.entry_count;
                dir.child_blocks.push(ChildRef {
                    chain_id: block.chain_id,
                    hash: block.partial_hash,
                });
            }
        }
        Ok(())
    }

    /// Builds a generic entry block, fetching every referenced entry.
    ///
    /// Entries are referenced by hash, not embedded; each one costs its own
    /// round trip. Minute-marker sentinels are not entries themselves: each
    /// marker is backfilled onto the run of entries since the previous one.
    async fn entry_block_record(
        &self,
        decoded: &DecodedEntryBlock,
        raw: &[u8],
        dir: &DirectoryRecord,
    ) -> Result<BlockRecord, SyncError> {
        let mut entries: Vec<EntryRecord> = Vec::new();
        let mut marked = 0;

        for reference in &decoded.refs {
            if is_minute_marker(reference) {
                for entry in &mut entries[marked..] {
                    entry.minute_marker = Some(reference.clone());
                }
                marked = entries.len();
                continue;
            }
            entries.push(self.fetch_entry(reference, &dir.block_time).await?);
        }

        Ok(BlockRecord {
            chain_id: decoded.chain_id.clone(),
            full_hash: decoded.full_hash.clone(),
            partial_hash: decoded.partial_hash.clone(),
            prev_hash: decoded.prev_hash.clone(),
            next_hash: None,
            kind: BlockKind::Entry,
            entry_count: entries.len() as u64,
            entry_ids: Vec::new(),
            entries,
            canonical: decoded.canonical.clone(),
            raw: hex::encode(raw),
            timestamp: dir.block_time.clone(),
            totals: None,
        })
    }

    async fn fetch_entry(&self, hash: &str, block_time: &str) -> Result<EntryRecord, SyncError> {
        let raw = self.client.raw_data(hash).await?;
        let decoded = self.codec.decode_entry(&raw).map_err(|source| SyncError::Decode {
            hash: hash.to_string(),
            source,
        })?;

        Ok(EntryRecord {
            chain_id: decoded.chain_id,
            hash: decoded.hash,
            timestamp: block_time.to_string(),
            canonical: decoded.canonical,
            raw: hex::encode(&raw),
            summary: None,
            content: Some(HexText::from_bytes(&decoded.content)),
            external_ids: decoded
                .external_ids
                .iter()
                .map(|id| HexText::from_bytes(id))
                .collect(),
            minute_marker: None,
            attestation: None,
            amounts: None,
        })
    }
}

/// Normalizes an admin or credit block; their sub-records share one shape.
fn system_block_record(
    kind: BlockKind,
    decoded: &DecodedSystemBlock,
    raw: &[u8],
    dir: &DirectoryRecord,
) -> BlockRecord {
    let entries: Vec<EntryRecord> = decoded
        .records
        .iter()
        .map(|record| EntryRecord {
            chain_id: decoded.chain_id.clone(),
            hash: record.hash.clone(),
            timestamp: dir.block_time.clone(),
            canonical: record.canonical.clone(),
            raw: record.raw_hex.clone(),
            summary: Some(record.summary.clone()),
            content: None,
            external_ids: Vec::new(),
            minute_marker: None,
            attestation: None,
            amounts: None,
        })
        .collect();

    BlockRecord {
        chain_id: decoded.chain_id.clone(),
        full_hash: decoded.full_hash.clone(),
        partial_hash: decoded.partial_hash.clone(),
        prev_hash: decoded.prev_hash.clone(),
        next_hash: None,
        kind,
        entry_count: entries.len() as u64,
        entry_ids: Vec::new(),
        entries,
        canonical: decoded.canonical.clone(),
        raw: hex::encode(raw),
        timestamp: dir.block_time.clone(),
        totals: None,
    }
}

/// Normalizes a value-transfer block, computing per-transaction deltas and
/// block-level issuance aggregates in 8-decimal fixed point.
fn transfer_block_record(
    decoded: &DecodedTransferBlock,
    raw: &[u8],
    dir: &DirectoryRecord,
) -> BlockRecord {
    let mut inputs: i128 = 0;
    let mut outputs: i128 = 0;
    let mut credits: i128 = 0;
    let mut created: i128 = 0;
    let mut destroyed: i128 = 0;

    let entries: Vec<EntryRecord> = decoded
        .transactions
        .iter()
        .map(|tx| {
            let tx_in = tx.inputs as i128;
            let tx_out = tx.outputs as i128;
            let delta = tx_out - tx_in;

            inputs += tx_in;
            outputs += tx_out;
            credits += tx.credits as i128;
            if delta > 0 {
                created += delta;
            } else {
                // Destroyed stays negative; the sign carries into the tally.
                destroyed += delta;
            }

            EntryRecord {
                chain_id: decoded.chain_id.clone(),
                hash: tx.hash.clone(),
                // Transactions carry their own mint time, unlike entries.
                timestamp: format_block_time(tx.millis / 1000),
                canonical: tx.canonical.clone(),
                raw: tx.raw_hex.clone(),
                summary: None,
                content: None,
                external_ids: Vec::new(),
                minute_marker: None,
                attestation: None,
                amounts: Some(EntryAmounts {
                    inputs: format_units(tx_in),
                    outputs: format_units(tx_out),
                    credits: tx.credits.to_string(),
                    delta: format_units(delta),
                }),
            }
        })
        .collect();

    BlockRecord {
        chain_id: decoded.chain_id.clone(),
        full_hash: decoded.full_hash.clone(),
        partial_hash: decoded.partial_hash.clone(),
        prev_hash: decoded.prev_hash.clone(),
        next_hash: None,
        kind: BlockKind::Transfer,
        entry_count: entries.len() as u64,
        entry_ids: Vec::new(),
        entries,
        canonical: decoded.canonical.clone(),
        raw: hex::encode(raw),
        timestamp: dir.block_time.clone(),
        totals: Some(TransferTotals {
            inputs: format_units(inputs),
            outputs: format_units(outputs),
            credits: credits.to_string(),
            created: format_units(created),
            destroyed: format_units(destroyed),
            net_delta: format_units(outputs - inputs),
        }),
    }
}
