//! # tribunal-arbitration -- Arbitration Domain
//!
//! The pure core of the arbitration workflow. Nothing in this crate does
//! I/O; transports live in `tribunal-client` and sequencing in
//! `tribunal-workflow`.
//!
//! - **Dispute** (`dispute.rs`): on-chain dispute and escrow snapshots,
//!   decoded from `getDispute` / `getEscrow` return data.
//!
//! - **Evidence** (`evidence.rs`): integrity verification of fetched
//!   evidence against on-chain keccak-256 commitments.
//!
//! - **Prompt** (`prompt.rs`): the single system/user prompt pair shared by
//!   all arbitrators.
//!
//! - **Vote** (`vote.rs`): outcomes, raw model responses, and the parser
//!   that turns every response (including failures) into a vote.
//!
//! - **Consensus** (`consensus.rs`): the 2-of-3 rule with circuit-breaker
//!   dominance, plus what-if exploration.
//!
//! - **Verdict** (`verdict.rs`): the on-chain verdict record, its canonical
//!   hash, and operator signing.
//!
//! - **Transaction** (`transaction.rs`): `submitVerdict` calldata and the
//!   EIP-155 legacy transaction that carries it.
//!
//! ## Crate Policy
//!
//! - Depends on `tribunal-core` and `tribunal-crypto` internally.
//! - All on-chain digests are keccak-256; all confidences past the parse
//!   boundary are integers.
//! - Evidence content never reaches `Debug` output or logs.

pub mod consensus;
pub mod dispute;
pub mod error;
pub mod evidence;
pub mod prompt;
pub mod transaction;
pub mod verdict;
pub mod vote;

pub use consensus::{apply_consensus, what_if, ConsensusResult, VoteTally};
pub use dispute::{DisputeRecord, DisputeStatus, EscrowRecord};
pub use error::ArbitrationError;
pub use evidence::{evidence_commitment, Evidence, EvidenceDocument, Party};
pub use prompt::{ArbitrationPrompt, SYSTEM_PROMPT};
pub use transaction::{submit_verdict_calldata, LegacyTransaction, SignedTransaction};
pub use verdict::{recover_verdict_signer, sign_verdict, ModelVote, SignedVerdict, WorkflowVerdict};
pub use vote::{parse_model_response, Outcome, ParsedModelVerdict, RawModelResponse};
