//! # tribunal-workflow -- Arbitration Orchestration
//!
//! Drives one dispute from on-chain record to signed verdict:
//!
//! - **Capabilities** (`capability.rs`): the traits the orchestrator is
//!   wired with (`DisputeSource`, `EvidenceSource`, `OutputSink`,
//!   `Broadcaster`) and their live implementations.
//! - **Fetcher** (`fetcher.rs`): concurrent evidence fetch plus integrity check.
//! - **Retry** (`retry.rs`): optional transport-failure retry for model calls.
//! - **Submit** (`submit.rs`): direct broadcast of the settlement transaction.
//! - **Orchestrator** (`orchestrator.rs`): the stage sequence and batch policy.
//!
//! Hosted and local execution differ only in which capability
//! implementations are injected.

pub mod capability;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod output;
pub mod retry;
pub mod stage;
pub mod submit;

pub use capability::{Broadcaster, DisputeSource, EvidenceSource, OutputSink, RegistryReader};
pub use config::{BatchPolicy, ModelRetryPolicy, SubmissionMode, WorkflowConfig, OPERATOR_KEY_VAR};
pub use error::WorkflowError;
pub use fetcher::{fetch_verified_evidence, EvidencePair};
pub use orchestrator::{DisputeRun, RunContext, RunReport, Workflow};
pub use output::{StdoutSink, WorkflowOutput};
pub use retry::RetryingBackend;
pub use stage::WorkflowStage;
pub use submit::{DirectBroadcaster, SettlementParams};
