//! Shared fixtures: a scripted remote chain and engines wired to it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chainmirror_codec::wire::{
    sha256_hex, WireEntry, WireEntryBlock, WireHeader, WireSystemBlock, WireSystemRecord,
    WireTransaction, WireTransferBlock, WireTransferHeader,
};
use chainmirror_codec::WireCodec;
use chainmirror_core::cache::{CacheStore, KvBackend, MemoryBackend};
use chainmirror_core::types::{ADMIN_CHAIN_ID, CREDIT_CHAIN_ID, TRANSFER_CHAIN_ID, ZERO_HASH};
use chainmirror_core::{BlockCache, ChildRef, StoreError};
use chainmirror_node::{FixtureNode, RemoteDirectory};
use chainmirror_sync::{SyncConfig, SyncEngine};

// ─── Scripted chain ───────────────────────────────────────────────────────────

/// Builds a consistent backward-linked chain inside a [`FixtureNode`],
/// height by height from genesis up.
pub struct ChainSim {
    pub node: Arc<FixtureNode>,
    /// Directory hash per height.
    pub dirs: Vec<String>,
    height: u64,
    prev_dir: String,
    prev_partials: HashMap<String, String>,
}

impl ChainSim {
    pub fn new() -> Self {
        Self {
            node: Arc::new(FixtureNode::new()),
            dirs: Vec::new(),
            height: 0,
            prev_dir: ZERO_HASH.to_string(),
            prev_partials: HashMap::new(),
        }
    }

    /// Registers an entry's raw bytes and returns its hash for block refs.
    pub fn add_entry(&self, chain_id: &str, content: &[u8], ext_ids: &[&[u8]]) -> String {
        let entry = WireEntry {
            chain_id: chain_id.to_string(),
            content: hex::encode(content),
            ext_ids: ext_ids.iter().map(hex::encode).collect(),
        };
        let raw = serde_json::to_vec(&entry).unwrap();
        let hash = sha256_hex(&raw);
        self.node.add_raw(&hash, raw);
        hash
    }

    /// Mints one height: the three system blocks plus one block per listed
    /// generic chain. Returns the new directory hash and moves the head.
    pub fn push_height(
        &mut self,
        transfers: &[(u64, u64)],
        entry_chains: Vec<(String, Vec<String>)>,
    ) -> String {
        let mut children = vec![
            self.add_system_block(ADMIN_CHAIN_ID, "server_index"),
            self.add_system_block(CREDIT_CHAIN_ID, "purchase"),
            self.add_transfer_block(transfers),
        ];
        for (chain_id, refs) in entry_chains {
            children.push(self.add_entry_block(&chain_id, refs));
        }

        let dir_hash = format!("{:064x}", 0xd000 + self.height);
        self.node.add_directory(
            &dir_hash,
            RemoteDirectory {
                full_hash: format!("{:064x}", 0xf000 + self.height),
                prev_hash: self.prev_dir.clone(),
                sequence: self.height,
                timestamp: 1_700_000_000 + self.height as i64 * 600,
                child_blocks: children,
            },
        );
        self.node.set_head(&dir_hash);

        self.dirs.push(dir_hash.clone());
        self.prev_dir = dir_hash.clone();
        self.height += 1;
        dir_hash
    }

    fn prev_for(&self, chain_id: &str) -> String {
        self.prev_partials
            .get(chain_id)
            .cloned()
            .unwrap_or_else(|| ZERO_HASH.to_string())
    }

    fn register_block(&mut self, chain_id: &str, header_bytes: Vec<u8>, raw: Vec<u8>) -> ChildRef {
        let partial = sha256_hex(&header_bytes);
        self.node.add_raw(&partial, raw);
        self.prev_partials
            .insert(chain_id.to_string(), partial.clone());
        ChildRef {
            chain_id: chain_id.to_string(),
            hash: partial,
        }
    }

    fn add_system_block(&mut self, chain_id: &str, kind: &str) -> ChildRef {
        let block = WireSystemBlock {
            header: WireHeader {
                chain_id: chain_id.to_string(),
                prev_partial_hash: self.prev_for(chain_id),
                height: self.height,
            },
            records: vec![WireSystemRecord {
                kind: kind.to_string(),
                detail: serde_json::json!({ "height": self.height }),
            }],
        };
        let header_bytes = serde_json::to_vec(&block.header).unwrap();
        let raw = serde_json::to_vec(&block).unwrap();
        self.register_block(chain_id, header_bytes, raw)
    }

    fn add_transfer_block(&mut self, transfers: &[(u64, u64)]) -> ChildRef {
        let block = WireTransferBlock {
            header: WireTransferHeader {
                chain_id: TRANSFER_CHAIN_ID.to_string(),
                prev_partial_hash: self.prev_for(TRANSFER_CHAIN_ID),
                height: self.height,
                exchange_rate: 1000,
            },
            transactions: transfers
                .iter()
                .enumerate()
                .map(|(i, (total_in, total_out))| WireTransaction {
                    millis: (1_700_000_000 + self.height as i64 * 600 + i as i64) * 1000,
                    total_in: *total_in,
                    total_out: *total_out,
                    total_credit_units: 0,
                })
                .collect(),
        };
        let header_bytes = serde_json::to_vec(&block.header).unwrap();
        let raw = serde_json::to_vec(&block).unwrap();
        self.register_block(TRANSFER_CHAIN_ID, header_bytes, raw)
    }

    fn add_entry_block(&mut self, chain_id: &str, refs: Vec<String>) -> ChildRef {
        let block = WireEntryBlock {
            header: WireHeader {
                chain_id: chain_id.to_string(),
                prev_partial_hash: self.prev_for(chain_id),
                height: self.height,
            },
            refs,
        };
        let header_bytes = serde_json::to_vec(&block.header).unwrap();
        let raw = serde_json::to_vec(&block).unwrap();
        self.register_block(chain_id, header_bytes, raw)
    }
}

// ─── Engines ──────────────────────────────────────────────────────────────────

pub fn engine_with_store(
    sim: &ChainSim,
    store: CacheStore,
    anchor_chain_id: &str,
) -> (SyncEngine<Arc<FixtureNode>>, BlockCache) {
    let cache = BlockCache::new(store, anchor_chain_id);
    let config = SyncConfig {
        anchor_chain_id: anchor_chain_id.to_string(),
        poll_interval_ms: 10,
    };
    let engine = SyncEngine::new(
        Arc::clone(&sim.node),
        cache.clone(),
        Arc::new(WireCodec::new()),
        config,
    );
    (engine, cache)
}

pub fn engine_for(
    sim: &ChainSim,
    anchor_chain_id: &str,
) -> (SyncEngine<Arc<FixtureNode>>, BlockCache) {
    let store = CacheStore::new(Arc::new(MemoryBackend::new()));
    engine_with_store(sim, store, anchor_chain_id)
}

// ─── Write counting ───────────────────────────────────────────────────────────

/// Backend wrapper that counts durable writes per bucket.
pub struct CountingBackend {
    inner: MemoryBackend,
    puts: Mutex<HashMap<String, u64>>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
            puts: Mutex::new(HashMap::new()),
        }
    }

    /// Total writes to every bucket except `bucket`.
    pub fn puts_outside(&self, bucket: &str) -> u64 {
        self.puts
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name.as_str() != bucket)
            .map(|(_, count)| count)
            .sum()
    }
}

#[async_trait]
impl KvBackend for CountingBackend {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(bucket, key).await
    }

    async fn put(&self, bucket: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        *self
            .puts
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_insert(0) += 1;
        self.inner.put(bucket, key, value).await
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        self.inner.keys(bucket).await
    }

    async fn clear(&self, bucket: &str) -> Result<(), StoreError> {
        self.inner.clear(bucket).await
    }
}

// ─── Payload helpers ──────────────────────────────────────────────────────────

/// A minute-marker reference: all-zero hash ending in the minute digit.
pub fn minute_marker(minute: u8) -> String {
    let mut bytes = [0u8; 32];
    bytes[31] = minute;
    hex::encode(bytes)
}

/// Anchor entry content: attestation JSON plus the signature suffix.
pub fn attestation_content(directory_hash: &str, height: u64, tx_id: &str) -> Vec<u8> {
    let json = serde_json::json!({
        "version": 1,
        "height": height,
        "directory_hash": directory_hash,
        "record_height": height,
        "external": {
            "address": "1AnchorFundingAddress",
            "tx_id": tx_id,
            "block_height": 830_000,
            "block_hash": "e3".repeat(32),
            "offset": 1,
        },
    })
    .to_string();
    format!("{json}{}", "0".repeat(128)).into_bytes()
}
