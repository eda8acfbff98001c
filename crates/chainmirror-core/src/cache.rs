//! Two-tier cache: an in-process memo over a durable key/value backend.
//!
//! Reads go memo-first, then backend (populating the memo on the way back).
//! Writes go to both tiers, last-write-wins. Keys are lowercased on every
//! path so hash and name lookups are case-insensitive everywhere.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// Bucket namespaces used by the mirror.
pub mod bucket {
    /// Directory records by hash.
    pub const DIRECTORIES: &str = "directories";
    /// Height → directory hash index records.
    pub const DIRECTORY_HEIGHTS: &str = "directory_heights";
    /// Chain blocks by partial hash.
    pub const BLOCKS: &str = "blocks";
    /// Full hash → partial hash (and partial → partial) index records.
    pub const BLOCK_INDEXES: &str = "block_indexes";
    /// Entries by hash.
    pub const ENTRIES: &str = "entries";
    /// Chain registrations by chain id.
    pub const CHAINS: &str = "chains";
    /// Decoded chain name → chain id.
    pub const CHAIN_IDS_BY_NAME: &str = "chain_ids_by_name";
    /// Hex-encoded chain name → chain id.
    pub const CHAIN_IDS_BY_ENCODED_NAME: &str = "chain_ids_by_encoded_name";
    /// Chain id → ordered entry id list.
    pub const CHAIN_ENTRIES: &str = "chain_entries";
    /// Decoded external id → entry id list, for substring search.
    pub const EXTERNAL_IDS: &str = "external_ids";
    /// The single progress record.
    pub const PROGRESS: &str = "progress";

    /// Every bucket, in reset order.
    pub const ALL: [&str; 11] = [
        DIRECTORIES,
        DIRECTORY_HEIGHTS,
        BLOCKS,
        BLOCK_INDEXES,
        ENTRIES,
        CHAINS,
        CHAIN_IDS_BY_NAME,
        CHAIN_IDS_BY_ENCODED_NAME,
        CHAIN_ENTRIES,
        EXTERNAL_IDS,
        PROGRESS,
    ];
}

/// Durable tier of the cache.
///
/// Implementations include `MemoryBackend` and the SQLite store in
/// `chainmirror-storage`.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Fetch a value; absence is `Ok(None)`, never an error.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Upsert a value (last-write-wins).
    async fn put(&self, bucket: &str, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// All keys currently present in a bucket.
    async fn keys(&self, bucket: &str) -> Result<Vec<String>, StoreError>;

    /// Drop every record in a bucket.
    async fn clear(&self, bucket: &str) -> Result<(), StoreError>;
}

/// The two-tier store every other component reads and writes through.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KvBackend>,
    memo: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            memo: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn memo_key(bucket: &str, key: &str) -> String {
        format!("{bucket}/{key}")
    }

    /// Lowercases a key; hex hashes and names are matched case-insensitively.
    pub fn normalize_key(key: &str) -> String {
        key.to_lowercase()
    }

    /// Serializes and persists a record, refreshing the memo tier.
    pub async fn put<T: Serialize>(
        &self,
        bucket: &str,
        key: &str,
        record: &T,
    ) -> Result<(), StoreError> {
        let key = Self::normalize_key(key);
        let bytes = serde_json::to_vec(record)?;
        self.backend.put(bucket, &key, &bytes).await?;
        self.memo
            .lock()
            .unwrap()
            .insert(Self::memo_key(bucket, &key), bytes);
        Ok(())
    }

    /// Reads a record, memo tier first. Absence is `Ok(None)`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let key = Self::normalize_key(key);
        let memo_key = Self::memo_key(bucket, &key);
        let hit = self.memo.lock().unwrap().get(&memo_key).cloned();
        if let Some(bytes) = hit {
            return Ok(Some(serde_json::from_slice(&bytes)?));
        }
        match self.backend.get(bucket, &key).await? {
            Some(bytes) => {
                let record = serde_json::from_slice(&bytes)?;
                self.memo.lock().unwrap().insert(memo_key, bytes);
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// All keys in a bucket, straight from the durable tier.
    pub async fn keys(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        self.backend.keys(bucket).await
    }

    /// Clears every bucket and the memo tier.
    pub async fn reset(&self) -> Result<(), StoreError> {
        for bucket in bucket::ALL {
            self.backend.clear(bucket).await?;
        }
        self.memo.lock().unwrap().clear();
        tracing::info!("cache reset: all buckets cleared");
        Ok(())
    }
}

// ─── In-memory backend (for tests and ephemeral mirrors) ──────────────────────

use std::collections::BTreeMap;

/// In-memory backend; keys come back in sorted order.
#[derive(Default)]
pub struct MemoryBackend {
    data: Mutex<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .get(bucket)
            .and_then(|b| b.get(key).cloned()))
    }

    async fn put(&self, bucket: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.data
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear(&self, bucket: &str) -> Result<(), StoreError> {
        self.data.lock().unwrap().remove(bucket);
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (CacheStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        (CacheStore::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn write_through_and_read_back() {
        let (cache, backend) = store();
        cache.put(bucket::BLOCKS, "AB12", &"hello".to_string()).await.unwrap();

        // The durable tier saw the write, under the lowercased key.
        assert!(backend.get(bucket::BLOCKS, "ab12").await.unwrap().is_some());
        assert!(backend.get(bucket::BLOCKS, "AB12").await.unwrap().is_none());

        let got: Option<String> = cache.get(bucket::BLOCKS, "aB12").await.unwrap();
        assert_eq!(got.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn memo_serves_repeat_reads() {
        let (cache, backend) = store();
        cache.put(bucket::ENTRIES, "k1", &1u64).await.unwrap();

        // Clobber the durable tier behind the cache's back; the memo still
        // holds the written value.
        backend
            .put(bucket::ENTRIES, "k1", &serde_json::to_vec(&2u64).unwrap())
            .await
            .unwrap();
        let got: Option<u64> = cache.get(bucket::ENTRIES, "k1").await.unwrap();
        assert_eq!(got, Some(1));

        // A fresh cache over the same backend sees the newer value.
        let fresh = CacheStore::new(backend);
        let got: Option<u64> = fresh.get(bucket::ENTRIES, "k1").await.unwrap();
        assert_eq!(got, Some(2));
    }

    #[tokio::test]
    async fn absence_is_none_not_error() {
        let (cache, _) = store();
        let got: Option<String> = cache.get(bucket::CHAINS, "missing").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn reset_empties_every_bucket() {
        let (cache, _) = store();
        cache.put(bucket::DIRECTORIES, "d", &1u64).await.unwrap();
        cache.put(bucket::PROGRESS, "p", &2u64).await.unwrap();
        cache.reset().await.unwrap();
        let d: Option<u64> = cache.get(bucket::DIRECTORIES, "d").await.unwrap();
        let p: Option<u64> = cache.get(bucket::PROGRESS, "p").await.unwrap();
        assert!(d.is_none() && p.is_none());
    }
}
