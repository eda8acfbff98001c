//! The `LedgerCodec` trait.

use crate::error::CodecError;
use crate::records::{DecodedEntry, DecodedEntryBlock, DecodedSystemBlock, DecodedTransferBlock};

/// Decoder for the ledger's native record kinds.
///
/// Object-safe so the sync engine can hold an `Arc<dyn LedgerCodec>` and
/// tests can substitute their own decoders. The production implementation
/// is [`crate::wire::WireCodec`].
pub trait LedgerCodec: Send + Sync {
    fn decode_admin_block(&self, raw: &[u8]) -> Result<DecodedSystemBlock, CodecError>;

    fn decode_credit_block(&self, raw: &[u8]) -> Result<DecodedSystemBlock, CodecError>;

    fn decode_transfer_block(&self, raw: &[u8]) -> Result<DecodedTransferBlock, CodecError>;

    fn decode_entry_block(&self, raw: &[u8]) -> Result<DecodedEntryBlock, CodecError>;

    fn decode_entry(&self, raw: &[u8]) -> Result<DecodedEntry, CodecError>;
}
