//! Pass A — fetch: the head-to-genesis backward walk.

use chainmirror_core::types::{format_block_time, is_zero_hash};
use chainmirror_core::DirectoryRecord;
use chainmirror_node::LedgerClient;

use crate::error::SyncError;
use crate::SyncEngine;

impl<C: LedgerClient> SyncEngine<C> {
    /// Walks the directory chain backward from the remote head until it
    /// reconnects with prior work.
    ///
    /// Both stop conditions are checked every iteration: the frontier
    /// recorded by the last completed walk, and the zero-hash sentinel that
    /// marks true genesis. Already-cached heights are traversed without any
    /// network call.
    pub(crate) async fn fetch_pass(&self) -> Result<(), SyncError> {
        let mut progress = self.cache.progress().await?;

        let head = self.client.head().await?;
        if progress.next_head.is_none() {
            progress.next_head = Some(head.clone());
        }

        let mut cursor = progress
            .resume_fetch_from
            .clone()
            .or_else(|| progress.next_head.clone())
            .unwrap_or(head);

        tracing::info!(from = %cursor, frontier = %progress.last_known_block, "Fetch pass started");
        let mut fetched = 0u64;

        loop {
            self.check_stop()?;

            if cursor == progress.last_known_block || is_zero_hash(&cursor) {
                break;
            }

            if let Some(dir) = self.cache.directory(&cursor).await? {
                // Height already mirrored; keep walking without the node.
                if dir.sequence > progress.known_height {
                    progress.known_height = dir.sequence;
                }
                cursor = dir.prev_hash;
                continue;
            }

            let dir = self.fetch_directory(&cursor).await?;
            fetched += 1;
            if dir.sequence > progress.known_height {
                progress.known_height = dir.sequence;
            }

            // The height's own writes are durable before the cursor moves.
            progress.resume_fetch_from = Some(cursor.clone());
            self.cache.save_progress(&progress).await?;

            cursor = dir.prev_hash;
        }

        if let Some(next_head) = progress.next_head.take() {
            progress.last_known_block = next_head;
        }
        progress.resume_fetch_from = None;
        self.cache.save_progress(&progress).await?;

        tracing::info!(
            fetched,
            height = progress.known_height,
            frontier = %progress.last_known_block,
            "Fetch pass complete"
        );
        Ok(())
    }

    /// Fetches one directory block and everything minted at its height.
    ///
    /// Child blocks are classified and persisted first; the directory record
    /// is only written once all of them are durable, so a resume never finds
    /// a directory referencing unfetched children.
    async fn fetch_directory(&self, hash: &str) -> Result<DirectoryRecord, SyncError> {
        let remote = self.client.directory_block(hash).await?;

        let mut dir = DirectoryRecord {
            hash: hash.to_string(),
            full_hash: remote.full_hash,
            prev_hash: remote.prev_hash,
            sequence: remote.sequence,
            timestamp: remote.timestamp,
            block_time: format_block_time(remote.timestamp),
            ..DirectoryRecord::default()
        };

        for child in &remote.child_blocks {
            self.fetch_block(child, &mut dir).await?;
        }

        self.cache.save_directory(&dir).await?;
        tracing::info!(height = dir.sequence, hash = %dir.hash, "Mirrored directory block");
        Ok(dir)
    }
}
