//! # Model Votes
//!
//! Normalizes the three possible terminal states of a model call into a
//! [`ParsedModelVerdict`]:
//!
//! - transport failure: the call never produced text;
//! - parse failure: text was produced but is not a usable verdict;
//! - success: `{verdict, confidence, reasoning}` extracted from the text.
//!
//! The first two become the circuit-breaker sentinel (vote
//! `CIRCUIT_BREAKER`, confidence 0, `parse_success = false`) with the failure
//! message as reasoning. Nothing here retries.
//!
//! Models often wrap JSON in Markdown fences or a sentence of prose, so the
//! parser takes the span from the first `{` to the last `}`. Verdict names
//! match case-insensitively. A fractional confidence is rounded half-up
//! here and clamped to 0–100; everything downstream is integer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ArbitrationError;

/// Arbitration outcome, as the verifier's `uint8` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Release escrow to party A.
    FavorPartyA,
    /// Release escrow to party B.
    FavorPartyB,
    /// Evidence does not support either side.
    InsufficientEvidence,
    /// The arbitrators disagreed.
    NoConsensus,
    /// At least one arbitrator failed to produce a usable verdict.
    CircuitBreaker,
}

impl Outcome {
    /// All outcomes in index order.
    pub const ALL: [Outcome; 5] = [
        Outcome::FavorPartyA,
        Outcome::FavorPartyB,
        Outcome::InsufficientEvidence,
        Outcome::NoConsensus,
        Outcome::CircuitBreaker,
    ];

    /// The verdicts a model is allowed to return.
    pub const MODEL_VERDICTS: [Outcome; 3] = [
        Outcome::FavorPartyA,
        Outcome::FavorPartyB,
        Outcome::InsufficientEvidence,
    ];

    /// The on-chain `uint8` index.
    pub fn index(self) -> u8 {
        match self {
            Outcome::FavorPartyA => 0,
            Outcome::FavorPartyB => 1,
            Outcome::InsufficientEvidence => 2,
            Outcome::NoConsensus => 3,
            Outcome::CircuitBreaker => 4,
        }
    }

    /// Map an on-chain index back to an outcome.
    pub fn from_index(index: u8) -> Result<Self, ArbitrationError> {
        Outcome::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(ArbitrationError::UnknownOutcome(index))
    }

    /// Upper-snake name.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::FavorPartyA => "FAVOR_PARTY_A",
            Outcome::FavorPartyB => "FAVOR_PARTY_B",
            Outcome::InsufficientEvidence => "INSUFFICIENT_EVIDENCE",
            Outcome::NoConsensus => "NO_CONSENSUS",
            Outcome::CircuitBreaker => "CIRCUIT_BREAKER",
        }
    }

    /// Parse a verdict a model may legitimately return (case-insensitive).
    pub fn parse_model_verdict(s: &str) -> Option<Self> {
        let s = s.trim();
        Outcome::MODEL_VERDICTS
            .into_iter()
            .find(|o| o.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    /// Accepts any of the five names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Outcome::ALL
            .into_iter()
            .find(|o| o.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown outcome \"{s}\""))
    }
}

/// Transport-level result of one model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModelResponse {
    /// Registered model id.
    pub model_id: String,
    /// Text returned by the model; empty on transport failure.
    pub raw_text: String,
    /// Wall-clock duration of the call.
    pub duration_ms: u64,
    /// Transport failure message, if the call did not complete.
    pub error: Option<String>,
}

impl RawModelResponse {
    /// A completed call.
    pub fn success(model_id: impl Into<String>, raw_text: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            model_id: model_id.into(),
            raw_text: raw_text.into(),
            duration_ms,
            error: None,
        }
    }

    /// A call that failed at the transport layer.
    pub fn failure(model_id: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            model_id: model_id.into(),
            raw_text: String::new(),
            duration_ms,
            error: Some(error.into()),
        }
    }
}

/// A normalized vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedModelVerdict {
    /// Registered model id.
    pub model_id: String,
    /// The vote.
    pub vote: Outcome,
    /// Confidence in percent, 0–100.
    pub confidence_pct: u8,
    /// Free-text reasoning, or the failure message for the sentinel.
    pub reasoning: String,
    /// False for the circuit-breaker sentinel.
    pub parse_success: bool,
}

impl ParsedModelVerdict {
    /// The circuit-breaker sentinel.
    pub fn circuit_breaker(model_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            vote: Outcome::CircuitBreaker,
            confidence_pct: 0,
            reasoning: reason.into(),
            parse_success: false,
        }
    }

    /// A well-formed vote.
    pub fn new(
        model_id: impl Into<String>,
        vote: Outcome,
        confidence_pct: u8,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            vote,
            confidence_pct: confidence_pct.min(100),
            reasoning: reasoning.into(),
            parse_success: true,
        }
    }
}

/// Normalize a raw model response into a vote. Never fails.
pub fn parse_model_response(raw: &RawModelResponse) -> ParsedModelVerdict {
    if let Some(err) = &raw.error {
        return ParsedModelVerdict::circuit_breaker(&raw.model_id, format!("model call failed: {err}"));
    }
    match parse_verdict_text(&raw.raw_text) {
        Ok((vote, confidence_pct, reasoning)) => {
            ParsedModelVerdict::new(&raw.model_id, vote, confidence_pct, reasoning)
        }
        Err(reason) => {
            ParsedModelVerdict::circuit_breaker(&raw.model_id, format!("parse error: {reason}"))
        }
    }
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_confidence(value: Option<&Value>) -> Result<u8, String> {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        Some(_) | None => None,
    }
    .filter(|n| n.is_finite())
    .ok_or_else(|| "confidence is missing or not a number".to_string())?;
    let clamped = number.clamp(0.0, 100.0);
    // Round half-up; clamped to [0, 100] so the cast is exact.
    Ok((clamped + 0.5).floor() as u8)
}

fn parse_verdict_text(text: &str) -> Result<(Outcome, u8, String), String> {
    let json = extract_json_object(text).ok_or_else(|| "no JSON object in response".to_string())?;
    let value: Value = serde_json::from_str(json).map_err(|e| format!("invalid JSON: {e}"))?;
    let object = value
        .as_object()
        .ok_or_else(|| "response is not a JSON object".to_string())?;

    let verdict_text = object
        .get("verdict")
        .and_then(Value::as_str)
        .ok_or_else(|| "verdict is missing or not a string".to_string())?;
    let vote = Outcome::parse_model_verdict(verdict_text).ok_or_else(|| {
        format!(
            "verdict \"{verdict_text}\" is not one of FAVOR_PARTY_A, FAVOR_PARTY_B, INSUFFICIENT_EVIDENCE"
        )
    })?;
    let confidence = parse_confidence(object.get("confidence"))?;
    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok((vote, confidence, reasoning))
}
