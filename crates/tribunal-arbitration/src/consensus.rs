//! # Consensus Engine
//!
//! Reduces three votes to one outcome. Pure and synchronous; the input is
//! borrowed and never mutated.
//!
//! Rules, in strict priority order:
//!
//! 1. **Circuit breaker dominance.** Any `CIRCUIT_BREAKER` vote makes the
//!    outcome `CIRCUIT_BREAKER`, with `consensus_count` equal to the number
//!    of such votes and zero confidence. A failed arbitrator is a trust
//!    failure of the whole round, not noise to be outvoted.
//! 2. **Threshold.** Checked in the fixed order `FAVOR_PARTY_A`,
//!    `FAVOR_PARTY_B`, `INSUFFICIENT_EVIDENCE`; the first with at least two
//!    votes wins. Confidence is the mean of the agreeing votes' percentages
//!    in basis points, rounded half-up in integer arithmetic.
//! 3. **No consensus.** Otherwise `NO_CONSENSUS` with `consensus_count = 1`
//!    and zero confidence.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::ArbitrationError;
use crate::vote::{Outcome, ParsedModelVerdict};

/// Minimum number of agreeing votes.
pub const CONSENSUS_THRESHOLD: u8 = 2;

/// Votes cast for each outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    /// Votes for `FAVOR_PARTY_A`.
    pub favor_party_a: u8,
    /// Votes for `FAVOR_PARTY_B`.
    pub favor_party_b: u8,
    /// Votes for `INSUFFICIENT_EVIDENCE`.
    pub insufficient_evidence: u8,
    /// Votes for `NO_CONSENSUS`.
    pub no_consensus: u8,
    /// Votes for `CIRCUIT_BREAKER`.
    pub circuit_breaker: u8,
}

impl VoteTally {
    /// Count the votes.
    pub fn count(votes: &[ParsedModelVerdict]) -> Self {
        let mut tally = Self::default();
        for v in votes {
            *tally.slot(v.vote) += 1;
        }
        tally
    }

    fn slot(&mut self, outcome: Outcome) -> &mut u8 {
        match outcome {
            Outcome::FavorPartyA => &mut self.favor_party_a,
            Outcome::FavorPartyB => &mut self.favor_party_b,
            Outcome::InsufficientEvidence => &mut self.insufficient_evidence,
            Outcome::NoConsensus => &mut self.no_consensus,
            Outcome::CircuitBreaker => &mut self.circuit_breaker,
        }
    }

    /// Votes cast for `outcome`.
    pub fn get(&self, outcome: Outcome) -> u8 {
        match outcome {
            Outcome::FavorPartyA => self.favor_party_a,
            Outcome::FavorPartyB => self.favor_party_b,
            Outcome::InsufficientEvidence => self.insufficient_evidence,
            Outcome::NoConsensus => self.no_consensus,
            Outcome::CircuitBreaker => self.circuit_breaker,
        }
    }
}

/// Result of [`apply_consensus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    /// The settled outcome.
    pub final_outcome: Outcome,
    /// Number of votes behind the outcome.
    pub consensus_count: u8,
    /// Mean confidence of the agreeing votes, basis points 0–10000.
    pub aggregate_confidence_bps: u16,
    /// Per-outcome vote counts.
    pub tally: VoteTally,
    /// Which models agreed and which dissented.
    pub reasoning: String,
}

impl ConsensusResult {
    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}/3 models, confidence {}.{:02}%)",
            self.final_outcome,
            self.consensus_count,
            self.aggregate_confidence_bps / 100,
            self.aggregate_confidence_bps % 100
        )
    }
}

/// Round-half-up mean of `pcts`, in basis points.
fn mean_bps(pcts: &[u8]) -> u16 {
    if pcts.is_empty() {
        return 0;
    }
    let n = pcts.len() as u32;
    let sum: u32 = pcts.iter().map(|p| u32::from(*p)).sum();
    let bps = (sum * 100 * 2 + n) / (2 * n);
    bps.min(10_000) as u16
}

fn describe(votes: &[&ParsedModelVerdict]) -> String {
    let mut out = String::new();
    for (i, v) in votes.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{} ({})", v.model_id, v.vote);
    }
    out
}

/// Reduce three votes to one outcome.
pub fn apply_consensus(votes: &[ParsedModelVerdict; 3]) -> ConsensusResult {
    let tally = VoteTally::count(votes);

    if tally.circuit_breaker > 0 {
        let (tripped, others): (Vec<_>, Vec<_>) =
            votes.iter().partition(|v| v.vote == Outcome::CircuitBreaker);
        let mut reasoning = format!(
            "circuit breaker tripped by {}/3 models: {}",
            tally.circuit_breaker,
            describe(&tripped)
        );
        if !others.is_empty() {
            let _ = write!(reasoning, "; overridden: {}", describe(&others));
        }
        return ConsensusResult {
            final_outcome: Outcome::CircuitBreaker,
            consensus_count: tally.circuit_breaker,
            aggregate_confidence_bps: 0,
            tally,
            reasoning,
        };
    }

    for outcome in Outcome::MODEL_VERDICTS {
        let count = tally.get(outcome);
        if count >= CONSENSUS_THRESHOLD {
            let (agreeing, dissenting): (Vec<_>, Vec<_>) =
                votes.iter().partition(|v| v.vote == outcome);
            let pcts: Vec<u8> = agreeing.iter().map(|v| v.confidence_pct).collect();
            let mut reasoning = format!(
                "{count}/3 models agreed on {outcome}: {}",
                describe(&agreeing)
            );
            if !dissenting.is_empty() {
                let _ = write!(reasoning, "; dissenting: {}", describe(&dissenting));
            }
            return ConsensusResult {
                final_outcome: outcome,
                consensus_count: count,
                aggregate_confidence_bps: mean_bps(&pcts),
                tally,
                reasoning,
            };
        }
    }

    let all: Vec<&ParsedModelVerdict> = votes.iter().collect();
    ConsensusResult {
        final_outcome: Outcome::NoConsensus,
        consensus_count: 1,
        aggregate_confidence_bps: 0,
        tally,
        reasoning: format!("no consensus: {}", describe(&all)),
    }
}

/// Recompute consensus with vote `index` replaced by `hypothetical`.
///
/// Works on a copy; `votes` is left untouched.
pub fn what_if(
    votes: &[ParsedModelVerdict; 3],
    index: usize,
    hypothetical: ParsedModelVerdict,
) -> Result<ConsensusResult, ArbitrationError> {
    if index >= votes.len() {
        return Err(ArbitrationError::VoteIndexOutOfRange(index));
    }
    let mut scenario = votes.clone();
    scenario[index] = hypothetical;
    Ok(apply_consensus(&scenario))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(model: &str, vote: Outcome, pct: u8) -> ParsedModelVerdict {
        if vote == Outcome::CircuitBreaker {
            ParsedModelVerdict::circuit_breaker(model, "failed")
        } else {
            ParsedModelVerdict::new(model, vote, pct, "r")
        }
    }

    #[test]
    fn mean_bps_rounds_half_up() {
        assert_eq!(mean_bps(&[87, 82, 76]), 8167);
        assert_eq!(mean_bps(&[80, 70]), 7500);
        // 1/3 bps rounds down, 2/3 rounds up.
        assert_eq!(mean_bps(&[1, 0, 0]), 33);
        assert_eq!(mean_bps(&[1, 1, 0]), 67);
        assert_eq!(mean_bps(&[100, 100]), 10_000);
    }

    #[test]
    fn tally_counts_every_vote() {
        let votes = [
            v("a", Outcome::FavorPartyA, 10),
            v("b", Outcome::FavorPartyA, 10),
            v("c", Outcome::CircuitBreaker, 0),
        ];
        let tally = VoteTally::count(&votes);
        assert_eq!(tally.favor_party_a, 2);
        assert_eq!(tally.circuit_breaker, 1);
        assert_eq!(tally.get(Outcome::FavorPartyB), 0);
    }

    #[test]
    fn reasoning_lists_agreeing_and_dissenting() {
        let result = apply_consensus(&[
            v("m1", Outcome::FavorPartyB, 80),
            v("m2", Outcome::FavorPartyB, 70),
            v("m3", Outcome::FavorPartyA, 65),
        ]);
        assert_eq!(
            result.reasoning,
            "2/3 models agreed on FAVOR_PARTY_B: m1 (FAVOR_PARTY_B), m2 (FAVOR_PARTY_B); dissenting: m3 (FAVOR_PARTY_A)"
        );
    }

    #[test]
    fn circuit_breaker_reasoning_names_failed_models() {
        let result = apply_consensus(&[
            v("m1", Outcome::CircuitBreaker, 0),
            v("m2", Outcome::FavorPartyA, 90),
            v("m3", Outcome::CircuitBreaker, 0),
        ]);
        assert_eq!(result.consensus_count, 2);
        assert!(result.reasoning.contains("m1 (CIRCUIT_BREAKER), m3 (CIRCUIT_BREAKER)"));
        assert!(result.reasoning.contains("overridden: m2 (FAVOR_PARTY_A)"));
    }

    #[test]
    fn summary_formats_bps_as_percent() {
        let result = apply_consensus(&[
            v("m1", Outcome::FavorPartyA, 87),
            v("m2", Outcome::FavorPartyA, 82),
            v("m3", Outcome::FavorPartyA, 76),
        ]);
        assert_eq!(result.summary(), "FAVOR_PARTY_A (3/3 models, confidence 81.67%)");
    }

    #[test]
    fn what_if_rejects_bad_index() {
        let votes = [
            v("m1", Outcome::FavorPartyA, 87),
            v("m2", Outcome::FavorPartyA, 82),
            v("m3", Outcome::FavorPartyA, 76),
        ];
        assert!(matches!(
            what_if(&votes, 3, v("x", Outcome::FavorPartyB, 1)),
            Err(ArbitrationError::VoteIndexOutOfRange(3))
        ));
    }
}
