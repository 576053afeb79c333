//! Injected capabilities.
//!
//! The orchestrator sees only these traits. Live implementations wrap the
//! `tribunal-client` types; tests and alternative hosts provide their own.

use std::sync::Arc;

use tribunal_arbitration::{DisputeRecord, EscrowRecord, EvidenceDocument, Party, SignedVerdict};
use tribunal_client::{ChainRpcClient, EvidenceClient};
use tribunal_core::{Address, Bytes32};

use crate::error::WorkflowError;
use crate::output::WorkflowOutput;
use crate::stage::WorkflowStage;

/// Reads dispute state from the chain.
#[async_trait::async_trait]
pub trait DisputeSource: Send + Sync {
    /// The dispute record.
    async fn dispute(&self, dispute_id: &Bytes32) -> Result<DisputeRecord, WorkflowError>;

    /// The escrow backing the dispute.
    async fn escrow(&self, dispute_id: &Bytes32) -> Result<EscrowRecord, WorkflowError>;
}

/// Retrieves evidence plaintext. Verification happens in the fetcher.
#[async_trait::async_trait]
pub trait EvidenceSource: Send + Sync {
    /// One party's stored document.
    async fn fetch(&self, dispute_id: &Bytes32, party: Party) -> Result<EvidenceDocument, WorkflowError>;
}

/// Receives the terminal output of a run.
pub trait OutputSink: Send + Sync {
    /// Accept one output.
    fn emit(&self, output: &WorkflowOutput) -> Result<(), WorkflowError>;
}

/// Submits a signed verdict on-chain.
#[async_trait::async_trait]
pub trait Broadcaster: Send + Sync {
    /// Broadcast `submitVerdict(verdict, signature)`; returns the transaction hash.
    async fn broadcast(&self, signed: &SignedVerdict) -> Result<Bytes32, WorkflowError>;
}

/// [`DisputeSource`] over `eth_call` to the registry contract.
#[derive(Debug, Clone)]
pub struct RegistryReader {
    rpc: Arc<ChainRpcClient>,
    registry: Address,
}

impl RegistryReader {
    pub fn new(rpc: Arc<ChainRpcClient>, registry: Address) -> Self {
        Self { rpc, registry }
    }
}

#[async_trait::async_trait]
impl DisputeSource for RegistryReader {
    async fn dispute(&self, dispute_id: &Bytes32) -> Result<DisputeRecord, WorkflowError> {
        let stage = WorkflowStage::FetchDispute;
        let data = self
            .rpc
            .eth_call(&self.registry, &DisputeRecord::call_data(dispute_id))
            .await
            .map_err(WorkflowError::client(stage))?;
        DisputeRecord::decode(&data).map_err(WorkflowError::arbitration(stage))
    }

    async fn escrow(&self, dispute_id: &Bytes32) -> Result<EscrowRecord, WorkflowError> {
        let stage = WorkflowStage::FetchDispute;
        let data = self
            .rpc
            .eth_call(&self.registry, &EscrowRecord::call_data(dispute_id))
            .await
            .map_err(WorkflowError::client(stage))?;
        EscrowRecord::decode(&data).map_err(WorkflowError::arbitration(stage))
    }
}

#[async_trait::async_trait]
impl EvidenceSource for EvidenceClient {
    async fn fetch(&self, dispute_id: &Bytes32, party: Party) -> Result<EvidenceDocument, WorkflowError> {
        EvidenceClient::fetch(self, dispute_id, party)
            .await
            .map_err(WorkflowError::client(WorkflowStage::FetchEvidence))
    }
}
