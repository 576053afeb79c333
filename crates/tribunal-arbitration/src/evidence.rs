//! # Evidence Integrity
//!
//! Each party commits to its evidence on-chain as `keccak256(utf8(content))`
//! and uploads the plaintext to the private evidence store. The workflow
//! fetches the plaintext and accepts it only if it hashes to the commitment
//! and was submitted by the party the dispute names.
//!
//! ## Security Invariant
//!
//! An [`Evidence`] value can only be obtained through [`Evidence::verify`],
//! so any evidence reaching the prompt builder has passed both checks.
//! Content never appears in `Debug` output; only its hash and length do.

use std::fmt;

use serde::{Deserialize, Serialize};

use tribunal_core::{keccak256, Address, Bytes32};

use crate::dispute::DisputeRecord;
use crate::error::ArbitrationError;

/// One side of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    /// The claimant.
    A,
    /// The respondent.
    B,
}

impl Party {
    /// Path segment used by the evidence store: `a` or `b`.
    pub fn path_segment(self) -> &'static str {
        match self {
            Party::A => "a",
            Party::B => "b",
        }
    }

    /// This party's on-chain address.
    pub fn address_in(self, dispute: &DisputeRecord) -> Address {
        match self {
            Party::A => dispute.party_a,
            Party::B => dispute.party_b,
        }
    }

    /// This party's evidence commitment, if submitted.
    pub fn commitment_in(self, dispute: &DisputeRecord) -> Option<Bytes32> {
        match self {
            Party::A => dispute.evidence_hash_a,
            Party::B => dispute.evidence_hash_b,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::A => f.write_str("party A"),
            Party::B => f.write_str("party B"),
        }
    }
}

impl std::str::FromStr for Party {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Party::A),
            "b" => Ok(Party::B),
            other => Err(format!("unknown party \"{other}\" (expected a or b)")),
        }
    }
}

/// The commitment a party records on-chain for `content`.
pub fn evidence_commitment(content: &str) -> Bytes32 {
    keccak256(content.as_bytes())
}

/// Evidence store response body for `GET /evidence/{disputeId}/{a|b}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDocument {
    /// Plaintext evidence.
    pub content: String,
    /// Submission time, unix seconds.
    pub submitted_at: u64,
    /// Address of the submitter.
    pub party_address: Address,
}

impl fmt::Debug for EvidenceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvidenceDocument")
            .field("content", &format_args!("<{} bytes redacted>", self.content.len()))
            .field("submitted_at", &self.submitted_at)
            .field("party_address", &self.party_address)
            .finish()
    }
}

/// One party's evidence, verified against its on-chain commitment.
#[derive(Clone, PartialEq, Eq)]
pub struct Evidence {
    party: Party,
    party_address: Address,
    content: String,
    submitted_at: u64,
    content_hash: Bytes32,
}

impl Evidence {
    /// Verify a fetched document against the on-chain commitment and party
    /// address. Both failures are fatal.
    pub fn verify(
        party: Party,
        document: EvidenceDocument,
        commitment: &Bytes32,
        expected_party: &Address,
    ) -> Result<Self, ArbitrationError> {
        let actual = evidence_commitment(&document.content);
        if actual != *commitment {
            return Err(ArbitrationError::EvidenceIntegrityViolation {
                party,
                expected: *commitment,
                actual,
            });
        }
        if document.party_address != *expected_party {
            return Err(ArbitrationError::EvidencePartyMismatch {
                party,
                expected: *expected_party,
                actual: document.party_address,
            });
        }
        tracing::debug!(
            %party,
            content_hash = %actual,
            content_len = document.content.len(),
            "evidence verified"
        );
        Ok(Self {
            party,
            party_address: document.party_address,
            content: document.content,
            submitted_at: document.submitted_at,
            content_hash: actual,
        })
    }

    /// Which side submitted this evidence.
    pub fn party(&self) -> Party {
        self.party
    }

    /// The submitter's address.
    pub fn party_address(&self) -> Address {
        self.party_address
    }

    /// The verified plaintext.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Submission time, unix seconds.
    pub fn submitted_at(&self) -> u64 {
        self.submitted_at
    }

    /// keccak-256 of the content; equal to the on-chain commitment.
    pub fn content_hash(&self) -> Bytes32 {
        self.content_hash
    }
}

impl fmt::Debug for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evidence")
            .field("party", &self.party)
            .field("party_address", &self.party_address)
            .field("content", &format_args!("<{} bytes redacted>", self.content.len()))
            .field("submitted_at", &self.submitted_at)
            .field("content_hash", &self.content_hash)
            .finish()
    }
}
