//! Anchor attestation records and their lenient parser.
//!
//! Entries on the designated anchor chain carry a JSON attestation followed
//! by a fixed-length signature suffix. The parser strips the suffix and
//! decodes the rest; callers treat failures as skippable, not fatal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the hex signature appended after the attestation JSON.
pub const SIGNATURE_SUFFIX_LEN: usize = 128;

/// Proof that a directory block was recorded on an external ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorAttestation {
    pub version: u32,
    /// Ledger height the attestation covers.
    pub height: u64,
    /// Hash of the directory record being attested.
    pub directory_hash: String,
    pub record_height: u64,
    pub external: ExternalAnchor,
}

/// Where on the external ledger the attestation landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAnchor {
    pub address: String,
    pub tx_id: String,
    pub block_height: i64,
    pub block_hash: String,
    pub offset: i64,
}

/// Why an attestation payload could not be used.
#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("attestation content too short: {len} chars")]
    TooShort { len: usize },

    #[error("attestation JSON undecodable: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses an anchor entry's decoded content.
///
/// The trailing [`SIGNATURE_SUFFIX_LEN`] characters are the signature and
/// are discarded before JSON decoding.
pub fn parse_attestation(content: &str) -> Result<AnchorAttestation, AttestationError> {
    let bytes = content.as_bytes();
    if bytes.len() < SIGNATURE_SUFFIX_LEN {
        return Err(AttestationError::TooShort { len: bytes.len() });
    }
    let body = &bytes[..bytes.len() - SIGNATURE_SUFFIX_LEN];
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> String {
        serde_json::json!({
            "version": 1,
            "height": 41002,
            "directory_hash": "ab".repeat(32),
            "record_height": 41002,
            "external": {
                "address": "1ExampleAnchorAddress",
                "tx_id": "cd".repeat(32),
                "block_height": 512_344,
                "block_hash": "ef".repeat(32),
                "offset": 2,
            },
        })
        .to_string()
    }

    #[test]
    fn parses_valid_content() {
        let content = format!("{}{}", sample_json(), "0".repeat(SIGNATURE_SUFFIX_LEN));
        let att = parse_attestation(&content).unwrap();
        assert_eq!(att.height, 41002);
        assert_eq!(att.directory_hash, "ab".repeat(32));
        assert_eq!(att.external.tx_id, "cd".repeat(32));
    }

    #[test]
    fn rejects_short_content() {
        let err = parse_attestation("too small").unwrap_err();
        assert!(matches!(err, AttestationError::TooShort { len: 9 }));
    }

    #[test]
    fn rejects_suffix_only_content() {
        // Exactly one signature's worth of data leaves no JSON body.
        let err = parse_attestation(&"0".repeat(SIGNATURE_SUFFIX_LEN)).unwrap_err();
        assert!(matches!(err, AttestationError::Json(_)));
    }
}
