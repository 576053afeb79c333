//! # Orchestrator
//!
//! One dispute per run, through a fixed sequence of stages:
//!
//! ```text
//! FETCH_DISPUTE → VALIDATE_STATUS → FETCH_EVIDENCE → QUERY_MODELS →
//! CONSENSUS → SIGN → EMIT_OUTPUT [→ BROADCAST]
//! ```
//!
//! Every fatal error ends the run before a verdict is signed or emitted.
//! Model failures are not fatal; they become circuit-breaker votes, and a
//! circuit-breaker verdict is signed and emitted like any other outcome.

use std::sync::Arc;

use serde::Serialize;

use tribunal_arbitration::{
    apply_consensus, parse_model_response, sign_verdict, ArbitrationPrompt, ConsensusResult,
    DisputeStatus, EscrowRecord, ParsedModelVerdict, Party, SignedVerdict, WorkflowVerdict,
};
use tribunal_client::{ChainRpcClient, EvidenceClient, ModelBackend, ModelPanel};
use tribunal_core::{keccak256, Bytes32};
use tribunal_crypto::KeyProvider;

use crate::capability::{Broadcaster, DisputeSource, EvidenceSource, OutputSink, RegistryReader};
use crate::config::{BatchPolicy, ModelRetryPolicy, SubmissionMode, WorkflowConfig};
use crate::error::WorkflowError;
use crate::fetcher::fetch_verified_evidence;
use crate::output::WorkflowOutput;
use crate::retry::RetryingBackend;
use crate::stage::WorkflowStage;
use crate::submit::{DirectBroadcaster, SettlementParams};

/// Identity and clock of one run. Both are hashed into the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    /// Unique id of the run.
    pub run_id: Bytes32,
    /// Execution time, unix seconds.
    pub executed_at: u64,
}

impl RunContext {
    /// A random run id (keccak-256 of a UUIDv4) stamped with the current time.
    pub fn fresh() -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            run_id: keccak256(uuid::Uuid::new_v4().as_bytes()),
            executed_at: u64::try_from(now).unwrap_or(0),
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run identity.
    pub context: RunContext,
    /// Escrow snapshot at fetch time.
    pub escrow: EscrowRecord,
    /// Parsed votes in registration order.
    pub votes: [ParsedModelVerdict; 3],
    /// Consensus over `votes`.
    pub consensus: ConsensusResult,
    /// The sealed verdict.
    pub signed: SignedVerdict,
    /// What was handed to the sink.
    pub output: WorkflowOutput,
    /// Settlement transaction hash, in direct mode.
    pub transaction_hash: Option<Bytes32>,
}

/// Result for one id of a batch.
#[derive(Debug)]
pub struct DisputeRun {
    pub dispute_id: Bytes32,
    pub result: Result<RunReport, WorkflowError>,
}

/// The arbitration workflow over injected capabilities.
pub struct Workflow {
    disputes: Arc<dyn DisputeSource>,
    evidence: Arc<dyn EvidenceSource>,
    panel: ModelPanel,
    signer: Arc<dyn KeyProvider>,
    sink: Arc<dyn OutputSink>,
    broadcaster: Option<Arc<dyn Broadcaster>>,
    submission_mode: SubmissionMode,
    batch_policy: BatchPolicy,
}

impl Workflow {
    /// Workflow in handoff mode with the first-only batch policy.
    pub fn new(
        disputes: Arc<dyn DisputeSource>,
        evidence: Arc<dyn EvidenceSource>,
        panel: ModelPanel,
        signer: Arc<dyn KeyProvider>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            disputes,
            evidence,
            panel,
            signer,
            sink,
            broadcaster: None,
            submission_mode: SubmissionMode::Handoff,
            batch_policy: BatchPolicy::FirstOnly,
        }
    }

    /// Wire live clients from configuration. No network I/O happens here.
    pub fn from_config(
        config: &WorkflowConfig,
        signer: Arc<dyn KeyProvider>,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self, WorkflowError> {
        let client = &config.client;
        let timeout = config.timeout();
        let setup = WorkflowError::client(WorkflowStage::FetchDispute);

        let rpc = Arc::new(ChainRpcClient::new(client.rpc_url.clone(), timeout).map_err(setup)?);
        let evidence = EvidenceClient::from_config(&client.evidence)
            .map_err(WorkflowError::client(WorkflowStage::FetchEvidence))?;
        let panel = ModelPanel::from_configs(&client.models, timeout)
            .map_err(WorkflowError::client(WorkflowStage::QueryModels))?;

        let broadcaster = DirectBroadcaster::new(
            rpc.clone(),
            signer.clone(),
            SettlementParams {
                verifier: client.verifier_address,
                chain_id: client.chain_id,
                gas_limit: config.gas_limit,
                gas_price_pct: config.gas_price_pct,
            },
        );

        Ok(Self::new(
            Arc::new(RegistryReader::new(rpc, client.registry_address)),
            Arc::new(evidence),
            panel,
            signer,
            sink,
        )
        .with_broadcaster(Arc::new(broadcaster))
        .with_submission_mode(config.submission_mode)
        .with_batch_policy(config.batch_policy)
        .with_model_retry(config.model_retry))
    }

    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn Broadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn with_submission_mode(mut self, mode: SubmissionMode) -> Self {
        self.submission_mode = mode;
        self
    }

    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.batch_policy = policy;
        self
    }

    /// Wrap every model backend in a [`RetryingBackend`]. A single-attempt
    /// policy leaves the panel untouched.
    pub fn with_model_retry(mut self, policy: ModelRetryPolicy) -> Self {
        if policy.is_enabled() {
            self.panel = self.panel.map(|inner| -> Arc<dyn ModelBackend> {
                Arc::new(RetryingBackend::new(inner, policy))
            });
        }
        self
    }

    /// Run one dispute with a fresh run id and the current time.
    pub async fn run(&self, dispute_id: Bytes32) -> Result<RunReport, WorkflowError> {
        self.run_with(dispute_id, RunContext::fresh()).await
    }

    /// Run one dispute under an explicit run context.
    pub async fn run_with(&self, dispute_id: Bytes32, context: RunContext) -> Result<RunReport, WorkflowError> {
        let broadcaster = match (self.submission_mode, &self.broadcaster) {
            (SubmissionMode::Direct, None) => return Err(WorkflowError::BroadcasterMissing),
            (SubmissionMode::Direct, Some(b)) => Some(b.clone()),
            (SubmissionMode::Handoff, _) => None,
        };
        let enter = |stage: WorkflowStage| {
            tracing::info!(
                stage = %stage,
                dispute_id = %dispute_id,
                run_id = %context.run_id,
                "workflow stage"
            );
        };

        enter(WorkflowStage::FetchDispute);
        let (dispute, escrow) = tokio::try_join!(
            self.disputes.dispute(&dispute_id),
            self.disputes.escrow(&dispute_id),
        )?;
        tracing::info!(
            dispute_id = %dispute_id,
            status = %dispute.status,
            amount = dispute.amount,
            escrow_total = escrow.total(),
            party_a_funded = escrow.party_a_funded,
            party_b_funded = escrow.party_b_funded,
            "dispute loaded"
        );

        enter(WorkflowStage::ValidateStatus);
        if dispute.status != DisputeStatus::AwaitingArbitration {
            return Err(WorkflowError::InvalidDisputeStatus {
                dispute_id,
                status: dispute.status,
            });
        }
        for party in [Party::A, Party::B] {
            if party.commitment_in(&dispute).is_none() {
                return Err(WorkflowError::MissingEvidenceCommitment { dispute_id, party });
            }
        }

        enter(WorkflowStage::FetchEvidence);
        let evidence = fetch_verified_evidence(self.evidence.as_ref(), &dispute).await?;

        enter(WorkflowStage::QueryModels);
        let prompt = ArbitrationPrompt::new(&dispute, &evidence.a, &evidence.b);
        let raw = self.panel.query_all(&prompt).await;
        let votes = [
            parse_model_response(&raw[0]),
            parse_model_response(&raw[1]),
            parse_model_response(&raw[2]),
        ];
        for (raw, vote) in raw.iter().zip(&votes) {
            tracing::info!(
                dispute_id = %dispute_id,
                model_id = %vote.model_id,
                vote = %vote.vote,
                confidence_pct = vote.confidence_pct,
                parse_success = vote.parse_success,
                duration_ms = raw.duration_ms,
                "model vote"
            );
        }

        enter(WorkflowStage::Consensus);
        let consensus = apply_consensus(&votes);
        tracing::info!(
            dispute_id = %dispute_id,
            outcome = %consensus.final_outcome,
            consensus_count = consensus.consensus_count,
            confidence_bps = consensus.aggregate_confidence_bps,
            "consensus reached"
        );

        enter(WorkflowStage::Sign);
        let verdict = WorkflowVerdict::assemble(
            dispute_id,
            &consensus,
            &votes,
            evidence.a.content_hash(),
            evidence.b.content_hash(),
            context.executed_at,
            context.run_id,
        );
        let signed = sign_verdict(verdict, self.signer.as_ref())
            .map_err(WorkflowError::arbitration(WorkflowStage::Sign))?;

        enter(WorkflowStage::EmitOutput);
        let output = WorkflowOutput::new(&signed, &consensus);
        self.sink.emit(&output)?;

        let transaction_hash = match broadcaster {
            Some(b) => {
                enter(WorkflowStage::Broadcast);
                Some(b.broadcast(&signed).await?)
            }
            None => None,
        };

        Ok(RunReport {
            context,
            escrow,
            votes,
            consensus,
            signed,
            output,
            transaction_hash,
        })
    }

    /// Process a batch of dispute ids under the configured [`BatchPolicy`].
    pub async fn run_pending(&self, dispute_ids: &[Bytes32]) -> Result<Vec<DisputeRun>, WorkflowError> {
        let (first, rest) = dispute_ids.split_first().ok_or(WorkflowError::NoDisputes)?;
        match self.batch_policy {
            BatchPolicy::FirstOnly => {
                if !rest.is_empty() {
                    tracing::warn!(
                        processed = %first,
                        discarded = rest.len(),
                        "batch policy is first-only; remaining disputes not processed"
                    );
                }
                Ok(vec![DisputeRun {
                    dispute_id: *first,
                    result: self.run(*first).await,
                }])
            }
            BatchPolicy::All => {
                let mut runs = Vec::with_capacity(dispute_ids.len());
                for id in dispute_ids {
                    let result = self.run(*id).await;
                    if let Err(e) = &result {
                        tracing::error!(dispute_id = %id, "workflow run failed: {e}");
                    }
                    runs.push(DisputeRun {
                        dispute_id: *id,
                        result,
                    });
                }
                Ok(runs)
            }
        }
    }
}
