//! Workflow stages, in execution order.

use std::fmt;

use serde::Serialize;

/// One step of a run. Every transition is logged with this name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStage {
    FetchDispute,
    ValidateStatus,
    FetchEvidence,
    QueryModels,
    Consensus,
    Sign,
    EmitOutput,
    Broadcast,
}

impl WorkflowStage {
    /// All stages in order. `Broadcast` only runs in direct mode.
    pub const ALL: [WorkflowStage; 8] = [
        WorkflowStage::FetchDispute,
        WorkflowStage::ValidateStatus,
        WorkflowStage::FetchEvidence,
        WorkflowStage::QueryModels,
        WorkflowStage::Consensus,
        WorkflowStage::Sign,
        WorkflowStage::EmitOutput,
        WorkflowStage::Broadcast,
    ];

    /// Log name.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::FetchDispute => "FETCH_DISPUTE",
            WorkflowStage::ValidateStatus => "VALIDATE_STATUS",
            WorkflowStage::FetchEvidence => "FETCH_EVIDENCE",
            WorkflowStage::QueryModels => "QUERY_MODELS",
            WorkflowStage::Consensus => "CONSENSUS",
            WorkflowStage::Sign => "SIGN",
            WorkflowStage::EmitOutput => "EMIT_OUTPUT",
            WorkflowStage::Broadcast => "BROADCAST",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
