//! Terminal output of a run.

use std::io::Write;

use serde::{Deserialize, Serialize};

use tribunal_arbitration::{submit_verdict_calldata, ConsensusResult, SignedVerdict};
use tribunal_core::Bytes32;

use crate::capability::OutputSink;
use crate::error::WorkflowError;

/// What a run hands to its host: everything needed to submit the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutput {
    /// Dispute identifier.
    pub dispute_id: Bytes32,
    /// `0x`-hex `submitVerdict(verdict, signature)` calldata.
    pub calldata: String,
    /// Human-readable outcome line.
    pub verdict_summary: String,
    /// `0x`-hex 65-byte operator signature.
    pub signature: String,
    /// The signed verdict hash.
    pub verdict_hash: Bytes32,
}

impl WorkflowOutput {
    /// Build from a signed verdict and the consensus it records.
    pub fn new(signed: &SignedVerdict, consensus: &ConsensusResult) -> Self {
        Self {
            dispute_id: signed.verdict().dispute_id,
            calldata: format!("0x{}", hex::encode(submit_verdict_calldata(signed))),
            verdict_summary: format!("{}: {}", consensus.summary(), consensus.reasoning),
            signature: signed.signature().to_hex(),
            verdict_hash: signed.hash(),
        }
    }
}

/// Writes each output as one line of JSON to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&self, output: &WorkflowOutput) -> Result<(), WorkflowError> {
        let line = serde_json::to_string(output).map_err(|e| WorkflowError::Sink(e.to_string()))?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}").map_err(|e| WorkflowError::Sink(e.to_string()))
    }
}
