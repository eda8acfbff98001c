//! The `LedgerClient` trait and its request/response types.

use async_trait::async_trait;
use chainmirror_core::ChildRef;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::NodeError;

/// Which balance table to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    Credit,
    Transfer,
}

impl BalanceKind {
    /// URL path segment for this kind.
    pub fn as_path(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Transfer => "transfer",
        }
    }
}

impl fmt::Display for BalanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// A directory block as the remote node reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDirectory {
    pub full_hash: String,
    pub prev_hash: String,
    pub sequence: u64,
    /// Unix seconds the height was minted at.
    pub timestamp: i64,
    /// Every chain block at this height, reserved chains included.
    pub child_blocks: Vec<ChildRef>,
}

/// Read access to the remote ledger node.
///
/// Implementations include `HttpLedgerClient` and the scripted
/// `FixtureNode` used by tests.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Hash of the node's current head directory block.
    async fn head(&self) -> Result<String, NodeError>;

    /// Directory block metadata for a hash.
    async fn directory_block(&self, hash: &str) -> Result<RemoteDirectory, NodeError>;

    /// Raw bytes of a block or entry.
    async fn raw_data(&self, hash: &str) -> Result<Vec<u8>, NodeError>;

    /// Balance for an address on one of the two balance tables.
    async fn balance(&self, kind: BalanceKind, address: &str) -> Result<i64, NodeError>;
}

#[async_trait]
impl<C: LedgerClient + ?Sized> LedgerClient for std::sync::Arc<C> {
    async fn head(&self) -> Result<String, NodeError> {
        (**self).head().await
    }

    async fn directory_block(&self, hash: &str) -> Result<RemoteDirectory, NodeError> {
        (**self).directory_block(hash).await
    }

    async fn raw_data(&self, hash: &str) -> Result<Vec<u8>, NodeError> {
        (**self).raw_data(hash).await
    }

    async fn balance(&self, kind: BalanceKind, address: &str) -> Result<i64, NodeError> {
        (**self).balance(kind, address).await
    }
}
