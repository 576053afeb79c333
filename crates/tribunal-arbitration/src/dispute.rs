//! # Dispute Records
//!
//! The on-chain snapshot of a dispute and its escrow, as returned by the
//! registry's `getDispute(bytes32)` and `getEscrow(bytes32)` views.
//!
//! `getDispute` returns a single struct containing a `string`, so the
//! return data is one dynamic tuple: a head pointer (always `0x20`) followed
//! by nine head slots and the description tail. `getEscrow` returns five
//! static words.
//!
//! An all-zero evidence commitment means the party has not submitted yet;
//! it decodes to `None`.

use std::fmt;

use serde::{Deserialize, Serialize};

use tribunal_core::abi::{encode_call, AbiDecoder, Token, WORD};
use tribunal_core::{function_selector, Address, Bytes32, CodecError};

use crate::error::ArbitrationError;

/// Canonical signature of the dispute view.
pub const GET_DISPUTE_SIGNATURE: &str = "getDispute(bytes32)";

/// Canonical signature of the escrow view.
pub const GET_ESCROW_SIGNATURE: &str = "getEscrow(bytes32)";

/// Lifecycle status of a dispute, as the registry's `uint8` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    /// Filed, evidence window open.
    Open,
    /// One party has submitted; waiting on the other.
    EvidencePending,
    /// Both parties submitted; ready for the arbitration workflow.
    AwaitingArbitration,
    /// A verdict has been accepted on-chain.
    Resolved,
    /// Withdrawn before resolution.
    Cancelled,
}

impl DisputeStatus {
    /// The on-chain `uint8` index.
    pub fn index(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::EvidencePending => 1,
            Self::AwaitingArbitration => 2,
            Self::Resolved => 3,
            Self::Cancelled => 4,
        }
    }

    /// Map an on-chain index back to a status.
    pub fn from_index(index: u8) -> Result<Self, ArbitrationError> {
        match index {
            0 => Ok(Self::Open),
            1 => Ok(Self::EvidencePending),
            2 => Ok(Self::AwaitingArbitration),
            3 => Ok(Self::Resolved),
            4 => Ok(Self::Cancelled),
            other => Err(ArbitrationError::UnknownDisputeStatus(other)),
        }
    }

    /// Upper-snake name, as used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::EvidencePending => "EVIDENCE_PENDING",
            Self::AwaitingArbitration => "AWAITING_ARBITRATION",
            Self::Resolved => "RESOLVED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-chain dispute snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeRecord {
    /// Dispute identifier.
    pub id: Bytes32,
    /// Claimant.
    pub party_a: Address,
    /// Respondent.
    pub party_b: Address,
    /// Escrowed amount in wei.
    pub amount: u128,
    /// Current lifecycle status.
    pub status: DisputeStatus,
    /// Party A's evidence commitment, `None` if not yet submitted.
    pub evidence_hash_a: Option<Bytes32>,
    /// Party B's evidence commitment, `None` if not yet submitted.
    pub evidence_hash_b: Option<Bytes32>,
    /// Filing time, unix seconds.
    pub created_at: u64,
    /// Free-text description supplied at filing.
    pub description: String,
}

impl DisputeRecord {
    /// Calldata for `getDispute(id)`.
    pub fn call_data(id: &Bytes32) -> Vec<u8> {
        encode_call(
            function_selector(GET_DISPUTE_SIGNATURE),
            &[Token::FixedBytes(*id)],
        )
    }

    /// Decode `getDispute` return data.
    pub fn decode(data: &[u8]) -> Result<Self, ArbitrationError> {
        let wrap = |source: CodecError| ArbitrationError::Decode {
            what: "getDispute return data",
            source,
        };
        let outer = AbiDecoder::new(data);
        let tuple = outer.at(outer.pointer(0).map_err(wrap)?).map_err(wrap)?;

        let status_index = tuple.uint_u8(4 * WORD).map_err(wrap)?;
        Ok(Self {
            id: tuple.bytes32(0).map_err(wrap)?,
            party_a: tuple.address(WORD).map_err(wrap)?,
            party_b: tuple.address(2 * WORD).map_err(wrap)?,
            amount: tuple.uint(3 * WORD).map_err(wrap)?,
            status: DisputeStatus::from_index(status_index)?,
            evidence_hash_a: tuple.bytes32(5 * WORD).map_err(wrap)?.non_zero(),
            evidence_hash_b: tuple.bytes32(6 * WORD).map_err(wrap)?.non_zero(),
            created_at: tuple.uint_u64(7 * WORD).map_err(wrap)?,
            description: tuple.string(8 * WORD).map_err(wrap)?,
        })
    }
}

/// On-chain escrow snapshot for a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowRecord {
    /// Party A's deposit in wei.
    pub deposit_a: u128,
    /// Party B's deposit in wei.
    pub deposit_b: u128,
    /// Whether party A has funded.
    pub party_a_funded: bool,
    /// Whether party B has funded.
    pub party_b_funded: bool,
    /// Whether funds have been released.
    pub released: bool,
}

impl EscrowRecord {
    /// Calldata for `getEscrow(id)`.
    pub fn call_data(id: &Bytes32) -> Vec<u8> {
        encode_call(
            function_selector(GET_ESCROW_SIGNATURE),
            &[Token::FixedBytes(*id)],
        )
    }

    /// Decode `getEscrow` return data.
    pub fn decode(data: &[u8]) -> Result<Self, ArbitrationError> {
        let wrap = |source: CodecError| ArbitrationError::Decode {
            what: "getEscrow return data",
            source,
        };
        let dec = AbiDecoder::new(data);
        Ok(Self {
            deposit_a: dec.uint(0).map_err(wrap)?,
            deposit_b: dec.uint(WORD).map_err(wrap)?,
            party_a_funded: dec.bool(2 * WORD).map_err(wrap)?,
            party_b_funded: dec.bool(3 * WORD).map_err(wrap)?,
            released: dec.bool(4 * WORD).map_err(wrap)?,
        })
    }

    /// Sum of both deposits.
    pub fn total(&self) -> u128 {
        self.deposit_a.saturating_add(self.deposit_b)
    }
}
