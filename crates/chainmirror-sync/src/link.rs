//! Pass B — link: forward-pointer reconstruction.
//!
//! The remote chain only declares backward links. This pass walks the
//! freshly fetched span and sets `next_hash` on every record's predecessor,
//! for the directory chain and each sub-chain alike.

use chainmirror_core::types::is_zero_hash;
use chainmirror_core::DirectoryRecord;
use chainmirror_node::LedgerClient;

use crate::error::SyncError;
use crate::SyncEngine;

impl<C: LedgerClient> SyncEngine<C> {
    /// Walks directory records backward from the fetch frontier, linking
    /// each predecessor forward and fanning out into the height's
    /// sub-chains.
    ///
    /// Terminates at the zero-hash sentinel or at the previously linked
    /// frontier; a predecessor that already carries a forward link marks
    /// work done by an earlier run and is walked past without writes.
    pub(crate) async fn link_pass(&self) -> Result<(), SyncError> {
        let mut progress = self.cache.progress().await?;
        if progress.last_known_block == progress.last_processed_block {
            return Ok(());
        }

        let mut cursor = match progress.resume_link_from.clone() {
            Some(resume) => resume,
            None => {
                progress.next_linked_head = Some(progress.last_known_block.clone());
                progress.last_known_block.clone()
            }
        };

        tracing::info!(from = %cursor, frontier = %progress.last_processed_block, "Link pass started");

        loop {
            self.check_stop()?;

            let dir = self
                .cache
                .directory(&cursor)
                .await?
                .ok_or_else(|| SyncError::Missing {
                    what: "directory block",
                    hash: cursor.clone(),
                })?;

            if is_zero_hash(&dir.prev_hash) || cursor == progress.last_processed_block {
                if let Some(head) = progress.next_linked_head.take() {
                    progress.last_processed_block = head;
                }
                progress.resume_link_from = None;
                self.cache.save_progress(&progress).await?;
                break;
            }

            let mut prev = self
                .cache
                .directory(&dir.prev_hash)
                .await?
                .ok_or_else(|| SyncError::Missing {
                    what: "directory block",
                    hash: dir.prev_hash.clone(),
                })?;

            if prev.next_hash.is_some() {
                cursor = dir.prev_hash;
                continue;
            }

            // The height's sub-chains are linked before the directory link
            // and the cursor move, so a resume repeats the unit instead of
            // skipping half of it.
            self.link_height(&dir).await?;

            prev.next_hash = Some(dir.hash.clone());
            self.cache.save_directory(&prev).await?;

            progress.resume_link_from = Some(cursor.clone());
            self.cache.save_progress(&progress).await?;

            cursor = dir.prev_hash;
        }

        tracing::info!(frontier = %progress.last_processed_block, "Link pass complete");
        Ok(())
    }

    async fn link_height(&self, dir: &DirectoryRecord) -> Result<(), SyncError> {
        let system = [&dir.admin_block, &dir.credit_block, &dir.transfer_block];
        for child in dir.child_blocks.iter().chain(system) {
            if child.hash.is_empty() {
                continue;
            }
            self.link_chain(&child.hash).await?;
        }
        Ok(())
    }

    /// Backward-links one sub-chain, starting from its block at the height
    /// being processed.
    ///
    /// Stops at the chain's genesis or at the first predecessor that is
    /// already linked. Anchor-chain blocks have their entries correlated as
    /// they are visited; the genesis block is exempt, its first entry is
    /// the chain registration rather than an attestation.
    async fn link_chain(&self, start: &str) -> Result<(), SyncError> {
        let mut block = self
            .cache
            .block(start)
            .await?
            .ok_or_else(|| SyncError::Missing {
                what: "chain block",
                hash: start.to_string(),
            })?;

        loop {
            if is_zero_hash(&block.prev_hash) {
                return Ok(());
            }

            if block.chain_id == self.config.anchor_chain_id {
                self.correlate_anchors(&block).await?;
            }

            let mut prev = self
                .cache
                .block(&block.prev_hash)
                .await?
                .ok_or_else(|| SyncError::Missing {
                    what: "chain block",
                    hash: block.prev_hash.clone(),
                })?;

            if prev.next_hash.is_some() {
                return Ok(());
            }

            prev.next_hash = Some(block.partial_hash.clone());
            self.cache.save_block(&mut prev).await?;
            block = prev;
        }
    }
}
