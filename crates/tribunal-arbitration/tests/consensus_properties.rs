//! Consensus engine properties: the four reference scenarios, an exhaustive
//! sweep over all 125 vote triples, and proptest over confidences.

use proptest::prelude::*;

use tribunal_arbitration::{apply_consensus, what_if, Outcome, ParsedModelVerdict};

const MODELS: [&str; 3] = ["gpt-4o", "claude-3-5-sonnet", "gemini-1.5-pro"];

fn vote(i: usize, outcome: Outcome, pct: u8) -> ParsedModelVerdict {
    match outcome {
        Outcome::CircuitBreaker => ParsedModelVerdict::circuit_breaker(MODELS[i], "model call failed"),
        other => ParsedModelVerdict::new(MODELS[i], other, pct, format!("reasoning {i}")),
    }
}

fn triple(outcomes: [Outcome; 3], pcts: [u8; 3]) -> [ParsedModelVerdict; 3] {
    [
        vote(0, outcomes[0], pcts[0]),
        vote(1, outcomes[1], pcts[1]),
        vote(2, outcomes[2], pcts[2]),
    ]
}

#[test]
fn scenario_a_unanimous() {
    let result = apply_consensus(&triple([Outcome::FavorPartyA; 3], [87, 82, 76]));
    assert_eq!(result.final_outcome, Outcome::FavorPartyA);
    assert_eq!(result.consensus_count, 3);
    assert_eq!(result.aggregate_confidence_bps, 8167);
    assert_eq!(result.tally.favor_party_a, 3);
}

#[test]
fn scenario_b_two_of_three() {
    let result = apply_consensus(&triple(
        [Outcome::FavorPartyB, Outcome::FavorPartyB, Outcome::FavorPartyA],
        [80, 70, 65],
    ));
    assert_eq!(result.final_outcome, Outcome::FavorPartyB);
    assert_eq!(result.consensus_count, 2);
    assert_eq!(result.aggregate_confidence_bps, 7500);
}

#[test]
fn scenario_c_total_disagreement() {
    let result = apply_consensus(&triple(
        [Outcome::FavorPartyA, Outcome::FavorPartyB, Outcome::InsufficientEvidence],
        [90, 90, 90],
    ));
    assert_eq!(result.final_outcome, Outcome::NoConsensus);
    assert_eq!(result.consensus_count, 1);
    assert_eq!(result.aggregate_confidence_bps, 0);
}

#[test]
fn scenario_d_one_failure_overrides_majority() {
    let result = apply_consensus(&triple(
        [Outcome::FavorPartyA, Outcome::FavorPartyA, Outcome::CircuitBreaker],
        [90, 85, 0],
    ));
    assert_eq!(result.final_outcome, Outcome::CircuitBreaker);
    assert_eq!(result.consensus_count, 1);
    assert_eq!(result.aggregate_confidence_bps, 0);
}

/// Straightforward restatement of the rule, used as the oracle.
fn expected(outcomes: [Outcome; 3], pcts: [u8; 3]) -> (Outcome, u8, u16) {
    let count = |o: Outcome| outcomes.iter().filter(|x| **x == o).count() as u8;
    let breakers = count(Outcome::CircuitBreaker);
    if breakers > 0 {
        return (Outcome::CircuitBreaker, breakers, 0);
    }
    for o in [Outcome::FavorPartyA, Outcome::FavorPartyB, Outcome::InsufficientEvidence] {
        let n = count(o);
        if n >= 2 {
            let sum: u32 = outcomes
                .iter()
                .zip(pcts)
                .filter(|(x, _)| **x == o)
                .map(|(_, p)| u32::from(p))
                .sum();
            let n = u32::from(n);
            let bps = (sum * 100 * 2 + n) / (2 * n);
            return (o, n as u8, bps as u16);
        }
    }
    (Outcome::NoConsensus, 1, 0)
}

#[test]
fn exhaustive_over_all_125_triples() {
    let pcts = [91, 64, 77];
    let mut seen = 0;
    for a in Outcome::ALL {
        for b in Outcome::ALL {
            for c in Outcome::ALL {
                let outcomes = [a, b, c];
                let votes = triple(outcomes, pcts);
                let snapshot = votes.clone();
                let result = apply_consensus(&votes);
                assert_eq!(votes, snapshot, "input mutated for {outcomes:?}");

                let (outcome, count, bps) = expected(outcomes, pcts);
                assert_eq!(result.final_outcome, outcome, "{outcomes:?}");
                assert_eq!(result.consensus_count, count, "{outcomes:?}");
                assert_eq!(result.aggregate_confidence_bps, bps, "{outcomes:?}");

                let tally_total = Outcome::ALL.iter().map(|o| result.tally.get(*o)).sum::<u8>();
                assert_eq!(tally_total, 3);
                seen += 1;
            }
        }
    }
    assert_eq!(seen, 125);
}

#[test]
fn what_if_leaves_input_untouched() {
    let votes = triple([Outcome::FavorPartyA; 3], [87, 82, 76]);
    let snapshot = votes.clone();
    let result = what_if(&votes, 2, vote(2, Outcome::CircuitBreaker, 0)).unwrap();
    assert_eq!(result.final_outcome, Outcome::CircuitBreaker);
    assert_eq!(votes, snapshot);
    assert_eq!(apply_consensus(&votes).final_outcome, Outcome::FavorPartyA);
}

#[test]
fn what_if_can_break_a_tie() {
    let votes = triple(
        [Outcome::FavorPartyA, Outcome::FavorPartyB, Outcome::InsufficientEvidence],
        [60, 70, 80],
    );
    let result = what_if(&votes, 2, vote(2, Outcome::FavorPartyB, 90)).unwrap();
    assert_eq!(result.final_outcome, Outcome::FavorPartyB);
    assert_eq!(result.aggregate_confidence_bps, 8000);
}

fn model_verdict() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::FavorPartyA),
        Just(Outcome::FavorPartyB),
        Just(Outcome::InsufficientEvidence),
    ]
}

fn any_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::FavorPartyA),
        Just(Outcome::FavorPartyB),
        Just(Outcome::InsufficientEvidence),
        Just(Outcome::NoConsensus),
        Just(Outcome::CircuitBreaker),
    ]
}

proptest! {
    #[test]
    fn majority_confidence_is_rounded_mean(
        majority in model_verdict(),
        minority in model_verdict(),
        p in proptest::array::uniform3(0u8..=100),
    ) {
        let votes = triple([majority, majority, minority], p);
        let result = apply_consensus(&votes);
        prop_assert_eq!(result.final_outcome, majority);
        let agreeing: Vec<u32> = votes
            .iter()
            .filter(|v| v.vote == majority)
            .map(|v| u32::from(v.confidence_pct))
            .collect();
        let n = agreeing.len() as u32;
        let sum: u32 = agreeing.iter().sum();
        prop_assert_eq!(u32::from(result.aggregate_confidence_bps), (sum * 200 + n) / (2 * n));
        prop_assert!(result.aggregate_confidence_bps <= 10_000);
    }

    #[test]
    fn any_breaker_dominates(
        outcomes in proptest::array::uniform3(any_outcome()),
        p in proptest::array::uniform3(0u8..=100),
    ) {
        let result = apply_consensus(&triple(outcomes, p));
        let breakers = outcomes.iter().filter(|o| **o == Outcome::CircuitBreaker).count() as u8;
        if breakers > 0 {
            prop_assert_eq!(result.final_outcome, Outcome::CircuitBreaker);
            prop_assert_eq!(result.consensus_count, breakers);
            prop_assert_eq!(result.aggregate_confidence_bps, 0);
        } else {
            prop_assert_ne!(result.final_outcome, Outcome::CircuitBreaker);
        }
    }
}
