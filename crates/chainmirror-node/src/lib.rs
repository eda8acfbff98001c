//! chainmirror-node — client for the remote ledger node.
//!
//! [`LedgerClient`] is the seam the sync engine fetches through.
//! [`HttpLedgerClient`] speaks the node's versioned JSON API;
//! [`FixtureNode`] is a scripted stand-in for tests.

pub mod address;
pub mod client;
pub mod error;
pub mod fixture;
pub mod http;

pub use address::{lookup_address, normalize_address, AddressInfo, AddressKind};
pub use client::{BalanceKind, LedgerClient, RemoteDirectory};
pub use error::NodeError;
pub use fixture::FixtureNode;
pub use http::HttpLedgerClient;
