//! Address normalization and balance classification.

use serde::Serialize;

use crate::client::{BalanceKind, LedgerClient};
use crate::error::NodeError;

/// Which balance table an address resolved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Credit,
    Transfer,
    Unknown,
}

/// Result of [`lookup_address`].
#[derive(Debug, Clone, Serialize)]
pub struct AddressInfo {
    /// The normalized address the balances were queried with.
    pub address: String,
    pub kind: AddressKind,
    pub credit_balance: Option<i64>,
    pub transfer_balance: Option<i64>,
}

/// Strips separator dashes; 72-char forms keep only their leading 64 chars.
pub fn normalize_address(raw: &str) -> String {
    let mut address = raw.replace('-', "");
    if address.len() == 72 && address.is_char_boundary(64) {
        address.truncate(64);
    }
    address
}

/// Classifies an address by asking the node for both balances.
///
/// The credit table is tried first; a lookup failure on one table just means
/// the address does not live there, so only a double miss yields `Unknown`.
pub async fn lookup_address<C: LedgerClient + ?Sized>(
    client: &C,
    raw: &str,
) -> Result<AddressInfo, NodeError> {
    let address = normalize_address(raw);

    let credit = client.balance(BalanceKind::Credit, &address).await.ok();
    let transfer = client.balance(BalanceKind::Transfer, &address).await.ok();

    let kind = match (credit, transfer) {
        (Some(_), _) => AddressKind::Credit,
        (None, Some(_)) => AddressKind::Transfer,
        (None, None) => AddressKind::Unknown,
    };
    Ok(AddressInfo {
        address,
        kind,
        credit_balance: credit,
        transfer_balance: transfer,
    })
}
