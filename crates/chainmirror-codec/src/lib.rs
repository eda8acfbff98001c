//! chainmirror-codec — decoding for the ledger's native record kinds.
//!
//! The [`LedgerCodec`] trait is the seam the sync engine decodes through;
//! [`WireCodec`] is the production JSON implementation. Monetary values are
//! 8-decimal fixed-point strings (see [`money`]) so persisted records carry
//! no float drift.

pub mod codec;
pub mod error;
pub mod money;
pub mod records;
pub mod wire;

pub use codec::LedgerCodec;
pub use error::CodecError;
pub use money::{format_units, parse_units, UNITS_PER_COIN};
pub use records::{
    DecodedEntry, DecodedEntryBlock, DecodedSubRecord, DecodedSystemBlock, DecodedTransaction,
    DecodedTransferBlock,
};
pub use wire::{is_minute_marker, sha256_hex, WireCodec};
