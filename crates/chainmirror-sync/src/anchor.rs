//! Anchor correlation: ties attestations on the designated anchor chain
//! back to the directory blocks they attest.

use chainmirror_core::BlockRecord;
use chainmirror_node::LedgerClient;

use crate::error::SyncError;
use crate::SyncEngine;

impl<C: LedgerClient> SyncEngine<C> {
    /// Records the external anchoring transaction on every directory block
    /// attested by an entry of `block`.
    ///
    /// Entries without a usable attestation are skipped. They only affect
    /// enrichment, never the mirrored chain itself.
    pub(crate) async fn correlate_anchors(&self, block: &BlockRecord) -> Result<(), SyncError> {
        for entry in &block.entries {
            let Some(attestation) = entry.attestation.as_ref() else {
                continue;
            };

            let Some(mut dir) = self.cache.directory(&attestation.directory_hash).await? else {
                tracing::warn!(
                    entry = %entry.hash,
                    directory = %attestation.directory_hash,
                    "Attested directory block is not mirrored, skipping"
                );
                continue;
            };

            if dir.anchor_entry.as_deref() == Some(entry.hash.as_str()) {
                continue;
            }

            dir.anchor_tx = Some(attestation.external.tx_id.clone());
            dir.anchor_entry = Some(entry.hash.clone());
            self.cache.save_directory(&dir).await?;
            tracing::debug!(
                height = dir.sequence,
                tx = %attestation.external.tx_id,
                "Recorded external anchor"
            );
        }
        Ok(())
    }
}
