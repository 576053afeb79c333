//! # Verdict Hash & Signer
//!
//! [`WorkflowVerdict`] is the record the verifier contract re-hashes. Its
//! encoding is `abi.encode` of the static tuple
//!
//! ```text
//! (bytes32 disputeId,
//!  uint8   finalOutcome,
//!  (bytes32 modelIdHash, uint8 vote, uint16 confidenceBps, bytes32 reasoningHash)[3],
//!  uint8   consensusCount,
//!  bytes32 evidenceHashA,
//!  bytes32 evidenceHashB,
//!  uint256 executedAt,
//!  bytes32 workflowRunId)
//! ```
//!
//! which is 19 words with no offsets. Model ids and reasoning text enter
//! only as keccak-256 digests.
//!
//! ## Security Invariant
//!
//! Field order, widths and vote order are part of the hash. The same
//! [`Token`] tree produced by [`WorkflowVerdict::to_token`] feeds both the
//! hash and the `submitVerdict` calldata. After signing, the verdict is
//! sealed inside [`SignedVerdict`] and exposed read-only.

use serde::{Deserialize, Serialize};

use tribunal_core::abi::{encode, Token};
use tribunal_core::{eth_signed_message_hash, keccak256, Address, Bytes32};
use tribunal_crypto::{recover_address, KeyProvider, RecoverableSignature};

use crate::consensus::ConsensusResult;
use crate::error::ArbitrationError;
use crate::vote::{Outcome, ParsedModelVerdict};

/// Solidity type of the verdict tuple.
pub const VERDICT_TUPLE_TYPE: &str =
    "(bytes32,uint8,(bytes32,uint8,uint16,bytes32)[3],uint8,bytes32,bytes32,uint256,bytes32)";

/// One model's committed vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVote {
    /// Registered model id; committed as `keccak256(model_id)`.
    pub model_id: String,
    /// The vote.
    pub vote: Outcome,
    /// Confidence in basis points, 0–10000.
    pub confidence_bps: u16,
    /// `keccak256(reasoning)`.
    pub reasoning_hash: Bytes32,
}

impl ModelVote {
    /// Derive from a parsed verdict: percent × 100, reasoning hashed.
    pub fn from_parsed(parsed: &ParsedModelVerdict) -> Self {
        Self {
            model_id: parsed.model_id.clone(),
            vote: parsed.vote,
            confidence_bps: u16::from(parsed.confidence_pct.min(100)) * 100,
            reasoning_hash: keccak256(parsed.reasoning.as_bytes()),
        }
    }

    /// `keccak256(model_id)`, the on-chain model identifier.
    pub fn model_id_hash(&self) -> Bytes32 {
        keccak256(self.model_id.as_bytes())
    }

    fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::FixedBytes(self.model_id_hash()),
            Token::Uint(u128::from(self.vote.index())),
            Token::Uint(u128::from(self.confidence_bps)),
            Token::FixedBytes(self.reasoning_hash),
        ])
    }
}

/// The record whose hash the operator signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowVerdict {
    /// Dispute identifier.
    pub dispute_id: Bytes32,
    /// Consensus outcome.
    pub final_outcome: Outcome,
    /// Votes in registration order [model-1, model-2, model-3].
    pub model_votes: [ModelVote; 3],
    /// Votes behind the outcome.
    pub consensus_count: u8,
    /// Party A's evidence commitment.
    pub evidence_hash_a: Bytes32,
    /// Party B's evidence commitment.
    pub evidence_hash_b: Bytes32,
    /// Execution time, unix seconds.
    pub executed_at: u64,
    /// Unique id of this workflow run.
    pub workflow_run_id: Bytes32,
}

impl WorkflowVerdict {
    /// Assemble from the consensus result and the parsed votes it was
    /// computed from.
    pub fn assemble(
        dispute_id: Bytes32,
        consensus: &ConsensusResult,
        votes: &[ParsedModelVerdict; 3],
        evidence_hash_a: Bytes32,
        evidence_hash_b: Bytes32,
        executed_at: u64,
        workflow_run_id: Bytes32,
    ) -> Self {
        Self {
            dispute_id,
            final_outcome: consensus.final_outcome,
            model_votes: [
                ModelVote::from_parsed(&votes[0]),
                ModelVote::from_parsed(&votes[1]),
                ModelVote::from_parsed(&votes[2]),
            ],
            consensus_count: consensus.consensus_count,
            evidence_hash_a,
            evidence_hash_b,
            executed_at,
            workflow_run_id,
        }
    }

    /// The verdict as an ABI tuple token.
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::FixedBytes(self.dispute_id),
            Token::Uint(u128::from(self.final_outcome.index())),
            Token::FixedArray(self.model_votes.iter().map(ModelVote::to_token).collect()),
            Token::Uint(u128::from(self.consensus_count)),
            Token::FixedBytes(self.evidence_hash_a),
            Token::FixedBytes(self.evidence_hash_b),
            Token::Uint(u128::from(self.executed_at)),
            Token::FixedBytes(self.workflow_run_id),
        ])
    }

    /// `abi.encode(verdict)`: 608 bytes.
    pub fn abi_encode(&self) -> Vec<u8> {
        encode(&[self.to_token()])
    }

    /// keccak-256 of [`Self::abi_encode`].
    pub fn hash(&self) -> Bytes32 {
        keccak256(self.abi_encode())
    }
}

/// A verdict sealed together with its hash and operator signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedVerdict {
    verdict: WorkflowVerdict,
    hash: Bytes32,
    signature: RecoverableSignature,
    signer: Address,
}

impl SignedVerdict {
    /// The signed verdict.
    pub fn verdict(&self) -> &WorkflowVerdict {
        &self.verdict
    }

    /// The verdict hash (before the signed-message envelope).
    pub fn hash(&self) -> Bytes32 {
        self.hash
    }

    /// `r || s || v` signature over `eth_signed_message_hash(hash)`.
    pub fn signature(&self) -> &RecoverableSignature {
        &self.signature
    }

    /// The operator address that produced the signature.
    pub fn signer(&self) -> Address {
        self.signer
    }

    /// Release the verdict, discarding the seal.
    pub fn into_verdict(self) -> WorkflowVerdict {
        self.verdict
    }
}

/// Hash and sign a verdict.
///
/// The signature is checked by recovering its address before it is
/// returned; a provider whose signature does not recover to its own
/// address is rejected.
pub fn sign_verdict(
    verdict: WorkflowVerdict,
    signer: &dyn KeyProvider,
) -> Result<SignedVerdict, ArbitrationError> {
    let hash = verdict.hash();
    let digest = eth_signed_message_hash(&hash);
    let signature = signer.sign_prehash(&digest)?;
    let expected = signer.address();
    let recovered = recover_address(&digest, &signature)?;
    if recovered != expected {
        return Err(ArbitrationError::SignerMismatch {
            expected,
            recovered,
        });
    }
    tracing::info!(
        dispute_id = %verdict.dispute_id,
        verdict_hash = %hash,
        signer = %expected,
        provider = signer.provider_name(),
        "verdict signed"
    );
    Ok(SignedVerdict {
        verdict,
        hash,
        signature,
        signer: expected,
    })
}

/// Recover the address that signed `hash` (after the signed-message
/// envelope).
pub fn recover_verdict_signer(
    hash: &Bytes32,
    signature: &RecoverableSignature,
) -> Result<Address, ArbitrationError> {
    Ok(recover_address(&eth_signed_message_hash(hash), signature)?)
}
