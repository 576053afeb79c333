//! # What-If Subcommand
//!
//! Explore the consensus rule without touching any service:
//!
//! ```text
//! tribunal what-if --votes FAVOR_PARTY_A,FAVOR_PARTY_A,FAVOR_PARTY_B \
//!     --confidence 87,82,76 --replace 2=CIRCUIT_BREAKER
//! ```

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use tribunal_arbitration::{apply_consensus, what_if, ConsensusResult, Outcome, ParsedModelVerdict};

/// Arguments for `tribunal what-if`.
#[derive(Args, Debug)]
pub struct WhatIfArgs {
    /// The three votes, comma-separated, in registration order.
    #[arg(long, value_delimiter = ',', required = true)]
    pub votes: Vec<Outcome>,

    /// Confidence percentages for the three votes (default 100 each).
    #[arg(long, value_delimiter = ',')]
    pub confidence: Option<Vec<u8>>,

    /// Model ids, comma-separated.
    #[arg(long, value_delimiter = ',', default_value = "model-1,model-2,model-3")]
    pub models: Vec<String>,

    /// Substitute vote `INDEX` (0-2): `INDEX=VOTE` or `INDEX=VOTE:CONFIDENCE`.
    #[arg(long)]
    pub replace: Option<Replacement>,
}

/// A hypothetical vote for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub index: usize,
    pub vote: Outcome,
    pub confidence_pct: u8,
}

impl FromStr for Replacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, rest) = s
            .split_once('=')
            .ok_or_else(|| format!("expected INDEX=VOTE[:CONFIDENCE], got \"{s}\""))?;
        let index = index
            .trim()
            .parse()
            .map_err(|e| format!("bad index \"{index}\": {e}"))?;
        let (vote, confidence_pct) = match rest.split_once(':') {
            Some((vote, pct)) => (
                vote,
                pct.trim()
                    .parse()
                    .map_err(|e| format!("bad confidence \"{pct}\": {e}"))?,
            ),
            None => (rest, 100),
        };
        Ok(Self {
            index,
            vote: vote.parse()?,
            confidence_pct,
        })
    }
}

fn verdict(model_id: &str, vote: Outcome, confidence_pct: u8) -> ParsedModelVerdict {
    match vote {
        Outcome::CircuitBreaker => ParsedModelVerdict::circuit_breaker(model_id, "circuit breaker vote"),
        other => ParsedModelVerdict::new(model_id, other, confidence_pct, ""),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WhatIfReport {
    baseline: ConsensusResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    hypothetical: Option<ConsensusResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome_changed: Option<bool>,
}

fn evaluate(args: &WhatIfArgs) -> Result<WhatIfReport> {
    if args.votes.len() != 3 || args.models.len() != 3 {
        bail!("exactly three votes and three model ids are required");
    }
    let pcts = match &args.confidence {
        Some(p) if p.len() == 3 => [p[0], p[1], p[2]],
        Some(_) => bail!("exactly three confidence values are required"),
        None => [100; 3],
    };
    let votes = [
        verdict(&args.models[0], args.votes[0], pcts[0]),
        verdict(&args.models[1], args.votes[1], pcts[1]),
        verdict(&args.models[2], args.votes[2], pcts[2]),
    ];
    let baseline = apply_consensus(&votes);

    let hypothetical = match &args.replace {
        Some(r) => {
            let model_id = args.models.get(r.index).map(String::as_str).unwrap_or("hypothetical");
            Some(
                what_if(&votes, r.index, verdict(model_id, r.vote, r.confidence_pct))
                    .context("applying replacement")?,
            )
        }
        None => None,
    };
    let outcome_changed = hypothetical
        .as_ref()
        .map(|h| h.final_outcome != baseline.final_outcome);
    Ok(WhatIfReport {
        baseline,
        hypothetical,
        outcome_changed,
    })
}

/// Execute the what-if subcommand.
pub fn run_what_if(args: &WhatIfArgs) -> Result<u8> {
    let report = evaluate(args)?;
    crate::print_json(&report)?;
    Ok(0)
}
