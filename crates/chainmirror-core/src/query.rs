//! Read-only query surface over the cache.
//!
//! Everything here serves presentation: absence comes back as `None` or an
//! empty list, and in-progress sync work is invisible because readers only
//! ever see committed records.

use serde::Serialize;

use crate::block_cache::BlockCache;
use crate::error::StoreError;
use crate::types::{BlockRecord, ChainRegistration, DirectoryRecord, EntryRecord};

/// A chain registration bundled with its entries for display.
#[derive(Debug, Clone, Serialize)]
pub struct ChainView {
    pub registration: ChainRegistration,
    pub first_entry: Option<EntryRecord>,
    pub entries: Vec<EntryRecord>,
}

/// Query facade handed to the CLI (and any future presentation layer).
#[derive(Clone)]
pub struct LedgerQuery {
    cache: BlockCache,
}

impl LedgerQuery {
    pub fn new(cache: BlockCache) -> Self {
        Self { cache }
    }

    /// Highest fully-mirrored height.
    pub async fn height(&self) -> Result<u64, StoreError> {
        Ok(self.cache.progress().await?.known_height)
    }

    pub async fn block_by_hash(&self, hash: &str) -> Result<Option<BlockRecord>, StoreError> {
        self.cache.block(hash).await
    }

    pub async fn entry_by_hash(&self, hash: &str) -> Result<Option<EntryRecord>, StoreError> {
        self.cache.entry(hash).await
    }

    pub async fn directory_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<DirectoryRecord>, StoreError> {
        self.cache.directory(hash).await
    }

    pub async fn directory_by_height(
        &self,
        height: u64,
    ) -> Result<Option<DirectoryRecord>, StoreError> {
        self.cache.directory_by_height(height).await
    }

    /// Directory records for `lo..=hi`, skipping heights not yet mirrored.
    pub async fn directory_range(
        &self,
        lo: u64,
        hi: u64,
    ) -> Result<Vec<DirectoryRecord>, StoreError> {
        let mut out = Vec::new();
        for height in lo..=hi {
            if let Some(dir) = self.cache.directory_by_height(height).await? {
                out.push(dir);
            }
        }
        Ok(out)
    }

    /// The newest `count` directory records, highest first.
    pub async fn latest_directories(&self, count: u64) -> Result<Vec<DirectoryRecord>, StoreError> {
        let top = self.height().await?;
        let mut out = Vec::new();
        let mut height = top;
        loop {
            if out.len() as u64 == count {
                break;
            }
            if let Some(dir) = self.cache.directory_by_height(height).await? {
                out.push(dir);
            }
            if height == 0 {
                break;
            }
            height -= 1;
        }
        Ok(out)
    }

    /// Every registered chain, in key order.
    pub async fn chains(&self) -> Result<Vec<ChainRegistration>, StoreError> {
        let mut out = Vec::new();
        for id in self.cache.store().keys(crate::cache::bucket::CHAINS).await? {
            if let Some(chain) = self.cache.chain(&id).await? {
                out.push(chain);
            }
        }
        Ok(out)
    }

    /// Resolves a chain by registered name, or by chain id as a fallback.
    ///
    /// `limit == 0` means unpaged.
    pub async fn chain_by_name(
        &self,
        name: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Option<ChainView>, StoreError> {
        let chain_id = match self.cache.chain_id_by_name(name).await? {
            Some(id) => id,
            None => name.to_string(),
        };
        let Some(registration) = self.cache.chain(&chain_id).await? else {
            return Ok(None);
        };
        let first_entry = self.cache.entry(&registration.first_entry_id).await?;
        let entries = self
            .entries_by_chain(&registration.chain_id, offset, limit)
            .await?;
        Ok(Some(ChainView {
            registration,
            first_entry,
            entries,
        }))
    }

    /// A chain's entries ordered by timestamp, paged by `offset`/`limit`.
    pub async fn entries_by_chain(
        &self,
        chain_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<EntryRecord>, StoreError> {
        let mut entries = Vec::new();
        for id in self.cache.entry_ids_for_chain(chain_id).await? {
            if let Some(entry) = self.cache.entry(&id).await? {
                entries.push(entry);
            }
        }
        entries.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.hash.cmp(&b.hash))
        });
        let page: Vec<EntryRecord> = if limit == 0 {
            entries.into_iter().skip(offset).collect()
        } else {
            entries.into_iter().skip(offset).take(limit).collect()
        };
        Ok(page)
    }

    /// Entries whose decoded external ids contain `needle` (case-insensitive).
    pub async fn entries_by_external_id(
        &self,
        needle: &str,
    ) -> Result<Vec<EntryRecord>, StoreError> {
        let needle = needle.to_lowercase();
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for key in self.cache.store().keys(crate::cache::bucket::EXTERNAL_IDS).await? {
            if !key.contains(&needle) {
                continue;
            }
            let ids: Vec<String> = self
                .cache
                .store()
                .get(crate::cache::bucket::EXTERNAL_IDS, &key)
                .await?
                .unwrap_or_default();
            for id in ids {
                if seen.contains(&id) {
                    continue;
                }
                if let Some(entry) = self.cache.entry(&id).await? {
                    out.push(entry);
                }
                seen.push(id);
            }
        }
        Ok(out)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
