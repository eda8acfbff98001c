//! Typed persistence for the mirror's record kinds.
//!
//! Everything here is idempotent: saves are last-write-wins upserts and the
//! secondary indexes (height → hash, full → partial, chain → entry ids,
//! name → chain id) dedupe or first-win, so crashed passes can safely replay
//! their last unit of work.

use crate::anchor::parse_attestation;
use crate::cache::{bucket, CacheStore};
use crate::error::StoreError;
use crate::progress::SyncProgress;
use crate::types::{is_zero_hash, BlockKind, BlockRecord, ChainRegistration, DirectoryRecord, EntryRecord};

/// Key of the singleton progress record.
pub const PROGRESS_KEY: &str = "sync";

/// Typed wrapper over [`CacheStore`] keyed by the mirror's hash scheme.
#[derive(Clone)]
pub struct BlockCache {
    store: CacheStore,
    anchor_chain_id: String,
}

impl BlockCache {
    pub fn new(store: CacheStore, anchor_chain_id: impl Into<String>) -> Self {
        Self {
            store,
            anchor_chain_id: anchor_chain_id.into(),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn anchor_chain_id(&self) -> &str {
        &self.anchor_chain_id
    }

    // ─── Directory records ────────────────────────────────────────────────────

    /// Persists a directory record and its height index entry.
    pub async fn save_directory(&self, dir: &DirectoryRecord) -> Result<(), StoreError> {
        self.store.put(bucket::DIRECTORIES, &dir.hash, dir).await?;
        self.store
            .put(bucket::DIRECTORY_HEIGHTS, &dir.sequence.to_string(), &dir.hash)
            .await
    }

    pub async fn directory(&self, hash: &str) -> Result<Option<DirectoryRecord>, StoreError> {
        self.store.get(bucket::DIRECTORIES, hash).await
    }

    pub async fn directory_hash_by_height(
        &self,
        height: u64,
    ) -> Result<Option<String>, StoreError> {
        self.store
            .get(bucket::DIRECTORY_HEIGHTS, &height.to_string())
            .await
    }

    pub async fn directory_by_height(
        &self,
        height: u64,
    ) -> Result<Option<DirectoryRecord>, StoreError> {
        match self.directory_hash_by_height(height).await? {
            Some(hash) => self.directory(&hash).await,
            None => Ok(None),
        }
    }

    // ─── Chain blocks ─────────────────────────────────────────────────────────

    /// Persists a block, its entries, and its hash indexes.
    ///
    /// Entries are stored individually first and their ids recorded on the
    /// block, so a block is never readable before its children. A generic
    /// block whose previous link is the zero sentinel also registers its
    /// chain.
    pub async fn save_block(&self, block: &mut BlockRecord) -> Result<(), StoreError> {
        let mut ids = Vec::with_capacity(block.entries.len());
        for entry in &block.entries {
            self.save_entry(entry).await?;
            ids.push(entry.hash.clone());
        }
        block.entry_ids = ids;

        if block.kind == BlockKind::Entry && is_zero_hash(&block.prev_hash) {
            self.record_chain(block).await?;
        }

        self.store
            .put(bucket::BLOCK_INDEXES, &block.full_hash, &block.partial_hash)
            .await?;
        self.store
            .put(bucket::BLOCK_INDEXES, &block.partial_hash, &block.partial_hash)
            .await?;
        self.store.put(bucket::BLOCKS, &block.partial_hash, block).await
    }

    /// Loads a block by either of its hashes, with entries populated.
    pub async fn block(&self, hash: &str) -> Result<Option<BlockRecord>, StoreError> {
        let Some(partial) = self
            .store
            .get::<String>(bucket::BLOCK_INDEXES, hash)
            .await?
        else {
            return Ok(None);
        };
        let Some(mut block) = self
            .store
            .get::<BlockRecord>(bucket::BLOCKS, &partial)
            .await?
        else {
            return Ok(None);
        };

        let mut entries = Vec::with_capacity(block.entry_ids.len());
        for id in &block.entry_ids {
            let entry = self.entry(id).await?.ok_or_else(|| StoreError::Missing {
                bucket: bucket::ENTRIES.to_string(),
                key: id.clone(),
            })?;
            entries.push(entry);
        }
        block.entries = entries;
        Ok(Some(block))
    }

    // ─── Entries ──────────────────────────────────────────────────────────────

    /// Persists one entry plus its chain and external-id index rows.
    pub async fn save_entry(&self, entry: &EntryRecord) -> Result<(), StoreError> {
        self.store.put(bucket::ENTRIES, &entry.hash, entry).await?;
        self.append_index(bucket::CHAIN_ENTRIES, &entry.chain_id, &entry.hash)
            .await?;
        for ext_id in &entry.external_ids {
            if !ext_id.text.is_empty() {
                self.append_index(bucket::EXTERNAL_IDS, &ext_id.text, &entry.hash)
                    .await?;
            }
        }
        Ok(())
    }

    /// Loads an entry; anchor-chain entries get their attestation re-parsed.
    pub async fn entry(&self, hash: &str) -> Result<Option<EntryRecord>, StoreError> {
        let Some(mut entry) = self.store.get::<EntryRecord>(bucket::ENTRIES, hash).await? else {
            return Ok(None);
        };
        if entry.chain_id == self.anchor_chain_id {
            if let Some(content) = &entry.content {
                match parse_attestation(&content.text) {
                    Ok(att) => entry.attestation = Some(att),
                    Err(err) => {
                        tracing::warn!(entry = %entry.hash, %err, "unusable anchor attestation");
                    }
                }
            }
        }
        Ok(Some(entry))
    }

    /// Appends `id` to the list at `key`, deduping repeats.
    async fn append_index(&self, bucket: &str, key: &str, id: &str) -> Result<(), StoreError> {
        let mut ids: Vec<String> = self.store.get(bucket, key).await?.unwrap_or_default();
        if ids.iter().any(|existing| existing == id) {
            return Ok(());
        }
        ids.push(id.to_string());
        self.store.put(bucket, key, &ids).await
    }

    pub async fn entry_ids_for_chain(&self, chain_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .store
            .get(bucket::CHAIN_ENTRIES, chain_id)
            .await?
            .unwrap_or_default())
    }

    // ─── Chain registrations ──────────────────────────────────────────────────

    /// Registers a chain from its genesis block's first entry.
    ///
    /// Name rows are first-come-first-served: a name already claimed by a
    /// different chain is logged and left alone.
    async fn record_chain(&self, block: &BlockRecord) -> Result<(), StoreError> {
        let Some(first) = block.entries.first() else {
            tracing::warn!(chain = %block.chain_id, "genesis block has no entries, chain not registered");
            return Ok(());
        };
        let registration = ChainRegistration {
            chain_id: block.chain_id.clone(),
            names: first.external_ids.clone(),
            first_entry_id: first.hash.clone(),
        };
        self.store
            .put(bucket::CHAINS, &registration.chain_id, &registration)
            .await?;
        for name in &registration.names {
            self.claim_name(bucket::CHAIN_IDS_BY_NAME, &name.text, &registration.chain_id)
                .await?;
            self.claim_name(
                bucket::CHAIN_IDS_BY_ENCODED_NAME,
                &name.hex,
                &registration.chain_id,
            )
            .await?;
        }
        Ok(())
    }

    async fn claim_name(&self, bucket: &str, name: &str, chain_id: &str) -> Result<(), StoreError> {
        if name.is_empty() {
            return Ok(());
        }
        if let Some(existing) = self.store.get::<String>(bucket, name).await? {
            if existing != chain_id {
                tracing::warn!(%name, %existing, claimant = %chain_id, "chain name collision, keeping first registration");
            }
            return Ok(());
        }
        self.store.put(bucket, name, &chain_id.to_string()).await
    }

    pub async fn chain(&self, chain_id: &str) -> Result<Option<ChainRegistration>, StoreError> {
        self.store.get(bucket::CHAINS, chain_id).await
    }

    /// Resolves a chain name, decoded form first, then hex-encoded form.
    pub async fn chain_id_by_name(&self, name: &str) -> Result<Option<String>, StoreError> {
        if let Some(id) = self.store.get(bucket::CHAIN_IDS_BY_NAME, name).await? {
            return Ok(Some(id));
        }
        self.store.get(bucket::CHAIN_IDS_BY_ENCODED_NAME, name).await
    }

    // ─── Progress ─────────────────────────────────────────────────────────────

    /// Loads the progress record, or the pristine default for an empty store.
    pub async fn progress(&self) -> Result<SyncProgress, StoreError> {
        Ok(self
            .store
            .get(bucket::PROGRESS, PROGRESS_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_progress(&self, progress: &SyncProgress) -> Result<(), StoreError> {
        self.store.put(bucket::PROGRESS, PROGRESS_KEY, progress).await
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
