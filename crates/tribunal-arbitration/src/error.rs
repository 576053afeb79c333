//! # Arbitration Error Types
//!
//! Structured error hierarchy for the arbitration domain.
//! Every variant carries enough context to diagnose the failure from the
//! message alone: the party, the expected and actual digests, the field
//! that failed to decode.
//!
//! Evidence integrity and party mismatches are fatal. They indicate that the
//! content served by the store is not the content the party committed to
//! on-chain, and the run must abort before any arbitrator sees it.

use thiserror::Error;

use tribunal_core::{Address, Bytes32, CodecError, CryptoError};

use crate::evidence::Party;

/// Errors arising from arbitration operations.
#[derive(Error, Debug)]
pub enum ArbitrationError {
    /// Evidence content does not hash to the on-chain commitment.
    #[error("evidence integrity violation for {party}: expected commitment {expected}, got {actual}")]
    EvidenceIntegrityViolation {
        /// Which side's evidence failed.
        party: Party,
        /// The commitment recorded on-chain.
        expected: Bytes32,
        /// keccak-256 of the content actually served.
        actual: Bytes32,
    },

    /// Evidence store reports a submitter other than the on-chain party.
    #[error("evidence for {party} was submitted by {actual}, but the dispute names {expected}")]
    EvidencePartyMismatch {
        /// Which side's evidence failed.
        party: Party,
        /// The party address recorded on-chain.
        expected: Address,
        /// The address reported by the evidence store.
        actual: Address,
    },

    /// The on-chain answer for a dispute or escrow could not be decoded.
    #[error("failed to decode {what}: {source}")]
    Decode {
        /// What was being decoded ("getDispute return data", ...).
        what: &'static str,
        /// Underlying codec error.
        #[source]
        source: CodecError,
    },

    /// A `uint8` dispute status outside the known range.
    #[error("unknown dispute status index {0}")]
    UnknownDisputeStatus(u8),

    /// A `uint8` outcome outside the known range.
    #[error("unknown outcome index {0}")]
    UnknownOutcome(u8),

    /// What-if substitution index outside 0..3.
    #[error("vote index {0} out of range (expected 0, 1 or 2)")]
    VoteIndexOutOfRange(usize),

    /// A freshly produced signature does not recover to the signer.
    #[error("signature self-check failed: expected signer {expected}, recovered {recovered}")]
    SignerMismatch {
        /// Address of the key provider.
        expected: Address,
        /// Address recovered from the produced signature.
        recovered: Address,
    },

    /// A raw transaction is structurally invalid.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Signing or recovery failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Encoding or decoding failed outside a more specific context.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_violation_display() {
        let err = ArbitrationError::EvidenceIntegrityViolation {
            party: Party::A,
            expected: Bytes32([0x11; 32]),
            actual: Bytes32([0x22; 32]),
        };
        let msg = format!("{err}");
        assert!(msg.contains("party A"));
        assert!(msg.contains(&"11".repeat(32)));
        assert!(msg.contains(&"22".repeat(32)));
    }

    #[test]
    fn party_mismatch_display() {
        let err = ArbitrationError::EvidencePartyMismatch {
            party: Party::B,
            expected: Address([0xaa; 20]),
            actual: Address([0xbb; 20]),
        };
        let msg = format!("{err}");
        assert!(msg.contains("party B"));
        assert!(msg.to_lowercase().contains(&"aa".repeat(20)));
    }

    #[test]
    fn decode_error_names_target() {
        let err = ArbitrationError::Decode {
            what: "getDispute return data",
            source: CodecError::UnexpectedEnd {
                offset: 32,
                needed: 32,
            },
        };
        assert!(format!("{err}").starts_with("failed to decode getDispute return data"));
    }

    #[test]
    fn signer_mismatch_display() {
        let err = ArbitrationError::SignerMismatch {
            expected: Address([1; 20]),
            recovered: Address([2; 20]),
        };
        assert!(format!("{err}").contains("self-check"));
    }

    #[test]
    fn crypto_error_is_transparent() {
        let err: ArbitrationError = CryptoError::Signature("bad".into()).into();
        assert_eq!(err.to_string(), "signature error: bad");
    }
}
