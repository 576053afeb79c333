//! # Arbitration Prompt
//!
//! One system prompt and one user prompt, rendered once per run and sent
//! unmodified to all three arbitrators. There is no per-model variation.

use std::fmt;

use tribunal_core::{Address, Bytes32};

use crate::dispute::DisputeRecord;
use crate::evidence::Evidence;

/// Fixed arbitrator instructions.
pub const SYSTEM_PROMPT: &str = "\
You are an impartial arbitrator resolving a financial dispute between two parties, \
Party A (the claimant) and Party B (the respondent). Funds are held in escrow and \
will be released according to your verdict.

Decide solely on the dispute description and the evidence each party submitted. \
Do not assume facts that are not in the evidence. If the evidence does not clearly \
support either party, return INSUFFICIENT_EVIDENCE.

Respond with a single JSON object and nothing else:
{\"verdict\": \"FAVOR_PARTY_A\" | \"FAVOR_PARTY_B\" | \"INSUFFICIENT_EVIDENCE\", \
\"confidence\": <integer 0-100>, \"reasoning\": \"<two to four sentences>\"}";

/// Input shared by all arbitrators.
#[derive(Clone, PartialEq, Eq)]
pub struct ArbitrationPrompt {
    /// Dispute identifier.
    pub dispute_id: Bytes32,
    /// Free-text description from the dispute record.
    pub description: String,
    /// Claimant address.
    pub party_a: Address,
    /// Respondent address.
    pub party_b: Address,
    evidence_a: String,
    evidence_b: String,
}

impl ArbitrationPrompt {
    /// Build from a dispute and both parties' verified evidence.
    pub fn new(dispute: &DisputeRecord, evidence_a: &Evidence, evidence_b: &Evidence) -> Self {
        Self {
            dispute_id: dispute.id,
            description: dispute.description.clone(),
            party_a: dispute.party_a,
            party_b: dispute.party_b,
            evidence_a: evidence_a.content().to_string(),
            evidence_b: evidence_b.content().to_string(),
        }
    }

    /// The system prompt.
    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    /// Render the user prompt.
    pub fn user_prompt(&self) -> String {
        format!(
            "Dispute ID: {}\n\
             Description: {}\n\n\
             Party A ({}) evidence:\n{}\n\n\
             Party B ({}) evidence:\n{}\n\n\
             Return your verdict as JSON.",
            self.dispute_id,
            self.description,
            self.party_a,
            self.evidence_a,
            self.party_b,
            self.evidence_b,
        )
    }
}

impl fmt::Debug for ArbitrationPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArbitrationPrompt")
            .field("dispute_id", &self.dispute_id)
            .field("party_a", &self.party_a)
            .field("party_b", &self.party_b)
            .field("evidence_a", &format_args!("<{} bytes redacted>", self.evidence_a.len()))
            .field("evidence_b", &format_args!("<{} bytes redacted>", self.evidence_b.len()))
            .finish_non_exhaustive()
    }
}
