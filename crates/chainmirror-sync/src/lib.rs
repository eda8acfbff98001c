//! The synchronization engine — mirrors a remote ledger into the local cache.
//!
//! One cycle runs three passes in order, each resumable after a crash:
//!
//! # Pass A: FETCH
//! Walk the directory chain from the remote head back toward the last known
//! frontier (or the zero-hash genesis sentinel), fetching and classifying
//! every block minted at each unseen height.
//!
//! # Pass B: LINK
//! Remote blocks only declare backward links. Walk the newly fetched span
//! and set `next_hash` on each record's predecessor, directory and chain
//! blocks alike, correlating anchor attestations along the way.
//!
//! # Pass C: TALLY
//! Roll the per-height supply delta of each value-transfer block into a
//! cumulative tally stored on the directory record.
//!
//! Progress cursors are persisted after every unit of work, always after the
//! unit's own cache writes, so a crash loses at most one unit and a restart
//! never observes a cursor pointing at missing data.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chainmirror_codec::LedgerCodec;
use chainmirror_core::BlockCache;
use chainmirror_node::LedgerClient;

pub mod config;
pub mod error;

mod anchor;
mod classify;
mod fetch;
mod link;
mod tally;

pub use config::{SyncConfig, DEFAULT_ANCHOR_CHAIN_ID};
pub use error::SyncError;

// ─── CyclePhase ───────────────────────────────────────────────────────────────

/// What the engine is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Fetching,
    Linking,
    Tallying,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::Linking => write!(f, "linking"),
            Self::Tallying => write!(f, "tallying"),
        }
    }
}

// ─── StopHandle ───────────────────────────────────────────────────────────────

/// Cooperative stop signal, checked between height iterations.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Asks the engine to stop after the unit of work in flight.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

// ─── SyncEngine ───────────────────────────────────────────────────────────────

/// Drives the fetch, link and tally passes against one remote node.
pub struct SyncEngine<C: LedgerClient> {
    pub(crate) client: C,
    pub(crate) cache: BlockCache,
    pub(crate) codec: Arc<dyn LedgerCodec>,
    pub(crate) config: SyncConfig,
    stop: Arc<AtomicBool>,
    phase: CyclePhase,
}

impl<C: LedgerClient> SyncEngine<C> {
    pub fn new(
        client: C,
        cache: BlockCache,
        codec: Arc<dyn LedgerCodec>,
        config: SyncConfig,
    ) -> Self {
        Self {
            client,
            cache,
            codec,
            config,
            stop: Arc::new(AtomicBool::new(false)),
            phase: CyclePhase::Idle,
        }
    }

    /// Handle for requesting a cooperative stop from another task.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop),
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Errors with [`SyncError::Stopped`] once the stop signal is raised.
    pub(crate) fn check_stop(&self) -> Result<(), SyncError> {
        if self.stop.load(Ordering::Relaxed) {
            Err(SyncError::Stopped)
        } else {
            Ok(())
        }
    }

    /// Runs one full synchronization cycle: fetch, then link, then tally.
    ///
    /// The later passes assume the earlier ones' writes are durable, so the
    /// order is fixed and the passes never overlap.
    pub async fn run_cycle(&mut self) -> Result<(), SyncError> {
        self.phase = CyclePhase::Fetching;
        self.fetch_pass().await?;
        self.phase = CyclePhase::Linking;
        self.link_pass().await?;
        self.phase = CyclePhase::Tallying;
        self.tally_pass().await?;
        self.phase = CyclePhase::Idle;
        Ok(())
    }

    /// Runs cycles forever, sleeping `poll_interval_ms` between them.
    ///
    /// Transient node failures are logged and retried on the next cycle;
    /// no cursor advances for the failed unit, so the retry picks up the
    /// same work. Store and integrity failures abort the run.
    pub async fn run(&mut self) -> Result<(), SyncError> {
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            match self.run_cycle().await {
                Ok(()) => {}
                Err(SyncError::Stopped) => {
                    self.phase = CyclePhase::Idle;
                    tracing::info!("Synchronization stopped");
                    return Ok(());
                }
                Err(err) if err.is_transient() => {
                    tracing::warn!(error = %err, "Transient failure, retrying next cycle");
                }
                Err(err) => {
                    self.phase = CyclePhase::Idle;
                    return Err(err);
                }
            }

            if self.check_stop().is_err() {
                tracing::info!("Synchronization stopped");
                return Ok(());
            }
            tokio::time::sleep(interval).await;
        }
    }
}
