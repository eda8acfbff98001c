//! Scripted in-memory node for tests and offline development.
//!
//! Counts every network-equivalent call per key, so tests can assert that
//! already-mirrored heights are never re-fetched, and supports injecting a
//! failure after N calls to exercise mid-pass crashes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use crate::client::{BalanceKind, LedgerClient, RemoteDirectory};
use crate::error::NodeError;

/// In-memory [`LedgerClient`] loaded by hand.
pub struct FixtureNode {
    head: Mutex<String>,
    directories: Mutex<HashMap<String, RemoteDirectory>>,
    raws: Mutex<HashMap<String, Vec<u8>>>,
    balances: Mutex<HashMap<String, i64>>,
    fetches: Mutex<HashMap<String, u64>>,
    log: Mutex<Vec<String>>,
    /// Calls left before injected failures start; -1 means disarmed.
    remaining_before_failure: AtomicI64,
}

impl FixtureNode {
    pub fn new() -> Self {
        Self {
            head: Mutex::new(String::new()),
            directories: Mutex::new(HashMap::new()),
            raws: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            fetches: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            remaining_before_failure: AtomicI64::new(-1),
        }
    }

    pub fn set_head(&self, hash: &str) {
        *self.head.lock().unwrap() = hash.to_string();
    }

    pub fn add_directory(&self, hash: &str, dir: RemoteDirectory) {
        self.directories.lock().unwrap().insert(hash.to_string(), dir);
    }

    pub fn add_raw(&self, hash: &str, bytes: Vec<u8>) {
        self.raws.lock().unwrap().insert(hash.to_string(), bytes);
    }

    pub fn set_balance(&self, kind: BalanceKind, address: &str, amount: i64) {
        self.balances
            .lock()
            .unwrap()
            .insert(format!("{kind}/{address}"), amount);
    }

    /// How many times a given hash (or `"head"`) was served.
    pub fn fetch_count(&self, key: &str) -> u64 {
        self.fetches.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> u64 {
        self.fetches.lock().unwrap().values().sum()
    }

    /// Every served key, in call order.
    pub fn fetch_log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// After `calls` more successful calls, every call fails until [`Self::heal`].
    pub fn fail_after(&self, calls: u64) {
        self.remaining_before_failure
            .store(calls as i64, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.remaining_before_failure.store(-1, Ordering::SeqCst);
    }

    fn tick(&self, key: &str) -> Result<(), NodeError> {
        let remaining = self.remaining_before_failure.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(NodeError::Http(format!("injected failure at {key}")));
        }
        if remaining > 0 {
            self.remaining_before_failure.fetch_sub(1, Ordering::SeqCst);
        }
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert(0) += 1;
        self.log.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

impl Default for FixtureNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for FixtureNode {
    async fn head(&self) -> Result<String, NodeError> {
        self.tick("head")?;
        let head = self.head.lock().unwrap().clone();
        if head.is_empty() {
            return Err(NodeError::Api("no head configured".to_string()));
        }
        Ok(head)
    }

    async fn directory_block(&self, hash: &str) -> Result<RemoteDirectory, NodeError> {
        self.tick(hash)?;
        self.directories
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| NodeError::Api(format!("unknown directory {hash}")))
    }

    async fn raw_data(&self, hash: &str) -> Result<Vec<u8>, NodeError> {
        self.tick(hash)?;
        self.raws
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or_else(|| NodeError::Api(format!("unknown raw {hash}")))
    }

    async fn balance(&self, kind: BalanceKind, address: &str) -> Result<i64, NodeError> {
        let key = format!("{kind}/{address}");
        self.tick(&key)?;
        self.balances
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .ok_or_else(|| NodeError::Api(format!("unknown address {address}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_every_served_call() {
        let node = FixtureNode::new();
        node.set_head("h5");
        node.add_raw("b1", vec![1, 2, 3]);

        node.head().await.unwrap();
        node.raw_data("b1").await.unwrap();
        node.raw_data("b1").await.unwrap();

        assert_eq!(node.fetch_count("head"), 1);
        assert_eq!(node.fetch_count("b1"), 2);
        assert_eq!(node.total_fetches(), 3);
        assert_eq!(node.fetch_log(), vec!["head", "b1", "b1"]);
    }

    #[tokio::test]
    async fn injected_failures_trip_then_heal() {
        let node = FixtureNode::new();
        node.set_head("h5");
        node.fail_after(1);

        node.head().await.unwrap();
        let err = node.head().await.unwrap_err();
        assert!(err.is_transient());
        assert!(node.head().await.is_err());

        node.heal();
        node.head().await.unwrap();
        // Failed calls are not counted as served.
        assert_eq!(node.fetch_count("head"), 2);
    }

    #[tokio::test]
    async fn unknown_records_are_permanent_errors() {
        let node = FixtureNode::new();
        let err = node.raw_data("missing").await.unwrap_err();
        assert!(!err.is_transient());
    }
}
