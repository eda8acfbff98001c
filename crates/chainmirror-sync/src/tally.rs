//! Pass C — tally: cumulative supply accounting.

use chainmirror_codec::money::{format_units, parse_units};
use chainmirror_node::LedgerClient;

use crate::error::SyncError;
use crate::SyncEngine;

impl<C: LedgerClient> SyncEngine<C> {
    /// Rolls each height's transfer-block net delta into a running tally
    /// stored on the directory record.
    ///
    /// The carried total is recovered from the last tallied record. A
    /// record whose tally write was lost to an interruption is walked past,
    /// and tallying resumes just above the nearest intact one. Arithmetic
    /// is integer fixed-point throughout; the stored strings are the only
    /// representation of money.
    pub(crate) async fn tally_pass(&self) -> Result<(), SyncError> {
        let mut progress = self.cache.progress().await?;
        if progress.is_empty() || progress.last_tallied_height == Some(progress.known_height) {
            return Ok(());
        }

        let mut carried: i128 = 0;
        let mut height: u64 = 0;
        while let Some(tallied) = progress.last_tallied_height {
            if let Some(dir) = self.cache.directory_by_height(tallied).await? {
                if let Some(tally) = dir.tally.as_deref() {
                    carried = parse_units(tally).map_err(|source| SyncError::Decode {
                        hash: dir.hash.clone(),
                        source,
                    })?;
                    height = tallied + 1;
                    break;
                }
            }
            progress.last_tallied_height = tallied.checked_sub(1);
        }

        let target = progress.known_height;
        tracing::info!(from = height, to = target, "Tally pass started");

        while height <= target {
            self.check_stop()?;

            let mut dir = self
                .cache
                .directory_by_height(height)
                .await?
                .ok_or(SyncError::MissingHeight { height })?;

            let transfer = self
                .cache
                .block(&dir.transfer_block.hash)
                .await?
                .ok_or_else(|| SyncError::Missing {
                    what: "transfer block",
                    hash: dir.transfer_block.hash.clone(),
                })?;

            let delta = match transfer.totals.as_ref() {
                Some(totals) => {
                    parse_units(&totals.net_delta).map_err(|source| SyncError::Decode {
                        hash: transfer.partial_hash.clone(),
                        source,
                    })?
                }
                None => 0,
            };

            carried += delta;
            let tally = format_units(carried);
            tracing::debug!(height, %tally, "Tallied height");
            dir.tally = Some(tally);
            self.cache.save_directory(&dir).await?;

            progress.last_tallied_height = Some(height);
            self.cache.save_progress(&progress).await?;

            height += 1;
        }

        tracing::info!(height = target, tally = %format_units(carried), "Tally pass complete");
        Ok(())
    }
}
