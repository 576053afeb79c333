//! Workflow error types.
//!
//! Precondition and integrity failures are fatal and end the run before
//! anything is signed. Errors from lower layers are tagged with the stage
//! they surfaced in.

use tribunal_arbitration::{ArbitrationError, DisputeStatus, Party};
use tribunal_client::{ClientError, ConfigError};
use tribunal_core::{Address, Bytes32, CryptoError};

use crate::stage::WorkflowStage;

/// Errors that end a workflow run.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The dispute is not awaiting arbitration.
    #[error("dispute {dispute_id} is {status}, expected AWAITING_ARBITRATION")]
    InvalidDisputeStatus {
        dispute_id: Bytes32,
        status: DisputeStatus,
    },
    /// A party has not committed evidence on-chain.
    #[error("dispute {dispute_id} has no evidence commitment from {party}")]
    MissingEvidenceCommitment { dispute_id: Bytes32, party: Party },
    /// A client call failed.
    #[error("{stage} failed: {source}")]
    Client {
        stage: WorkflowStage,
        #[source]
        source: ClientError,
    },
    /// A domain check or encoding step failed.
    #[error("{stage} failed: {source}")]
    Arbitration {
        stage: WorkflowStage,
        #[source]
        source: ArbitrationError,
    },
    /// The output sink refused the output.
    #[error("output sink failed: {0}")]
    Sink(String),
    /// Direct submission was requested without a broadcaster.
    #[error("direct submission requires a broadcaster")]
    BroadcasterMissing,
    /// The signed settlement transaction does not recover to the operator.
    #[error("settlement transaction recovers to {recovered}, expected operator {expected}")]
    SenderMismatch { expected: Address, recovered: Address },
    /// `run_pending` was given nothing to do.
    #[error("no dispute ids given")]
    NoDisputes,
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Operator key could not be loaded.
    #[error("operator key error: {0}")]
    Key(#[from] CryptoError),
}

impl WorkflowError {
    pub(crate) fn client(stage: WorkflowStage) -> impl FnOnce(ClientError) -> Self {
        move |source| Self::Client { stage, source }
    }

    pub(crate) fn arbitration(stage: WorkflowStage) -> impl FnOnce(ArbitrationError) -> Self {
        move |source| Self::Arbitration { stage, source }
    }

    /// Stage the error surfaced in, if it carries one.
    pub fn stage(&self) -> Option<WorkflowStage> {
        match self {
            Self::Client { stage, .. } | Self::Arbitration { stage, .. } => Some(*stage),
            Self::InvalidDisputeStatus { .. } | Self::MissingEvidenceCommitment { .. } => {
                Some(WorkflowStage::ValidateStatus)
            }
            Self::Sink(_) => Some(WorkflowStage::EmitOutput),
            Self::SenderMismatch { .. } => Some(WorkflowStage::Broadcast),
            Self::BroadcasterMissing | Self::NoDisputes | Self::Config(_) | Self::Key(_) => None,
        }
    }
}
