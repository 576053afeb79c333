//! Workflow configuration.
//!
//! Extends [`ClientConfig`] with the knobs that shape a run: how the signed
//! verdict leaves the process, how many disputes a batch processes, and
//! whether model calls are retried.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tribunal_client::{ClientConfig, ConfigError};

/// Environment variable holding the hex operator key.
pub const OPERATOR_KEY_VAR: &str = "TRIBUNAL_OPERATOR_KEY";

/// Default gas limit for `submitVerdict`.
pub const DEFAULT_GAS_LIMIT: u64 = 800_000;

/// Default gas price multiplier, percent of `eth_gasPrice`.
pub const DEFAULT_GAS_PRICE_PCT: u32 = 120;

/// How the signed verdict leaves the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionMode {
    /// Hand the output to the sink; something else submits it.
    #[default]
    Handoff,
    /// Also sign and broadcast the settlement transaction.
    Direct,
}

impl FromStr for SubmissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "handoff" => Ok(Self::Handoff),
            "direct" => Ok(Self::Direct),
            other => Err(format!("unknown submission mode \"{other}\" (expected handoff or direct)")),
        }
    }
}

/// What `run_pending` does with more than one dispute id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Process the first id and log the rest as discarded.
    #[default]
    FirstOnly,
    /// Process every id sequentially and independently.
    All,
}

impl FromStr for BatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first-only" => Ok(Self::FirstOnly),
            "all" => Ok(Self::All),
            other => Err(format!("unknown batch policy \"{other}\" (expected first or all)")),
        }
    }
}

/// Retry policy for model calls. Only transport failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRetryPolicy {
    /// Total attempts per model; 1 disables retry.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay_ms: u64,
}

impl Default for ModelRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 500,
        }
    }
}

impl ModelRetryPolicy {
    /// Whether any retry happens at all.
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay(&self, retry: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(2u64.saturating_pow(retry)))
    }
}

/// Everything needed to run the workflow against live services.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Endpoints and credentials.
    pub client: ClientConfig,
    /// Handoff or direct broadcast.
    pub submission_mode: SubmissionMode,
    /// Batch handling.
    pub batch_policy: BatchPolicy,
    /// Model-call retry.
    pub model_retry: ModelRetryPolicy,
    /// Gas limit for the settlement transaction.
    pub gas_limit: u64,
    /// Gas price multiplier in percent.
    pub gas_price_pct: u32,
}

impl WorkflowConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables, in addition to those read by [`ClientConfig::from_env`]:
    /// - `TRIBUNAL_OPERATOR_KEY` (required; presence checked here, loaded by the key provider)
    /// - `TRIBUNAL_SUBMISSION_MODE` (default: `handoff`)
    /// - `TRIBUNAL_BATCH_POLICY` (default: `first`)
    /// - `TRIBUNAL_MODEL_ATTEMPTS` (default: 1)
    /// - `TRIBUNAL_GAS_LIMIT` (default: 800000)
    /// - `TRIBUNAL_GAS_PRICE_PCT` (default: 120)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if get(OPERATOR_KEY_VAR).is_none() {
            return Err(ConfigError::Missing(OPERATOR_KEY_VAR.to_string()));
        }
        let client = ClientConfig::from_lookup(&lookup)?;

        let max_attempts: u32 = parse_or(&get, "TRIBUNAL_MODEL_ATTEMPTS", 1)?;
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "TRIBUNAL_MODEL_ATTEMPTS".into(),
                reason: "must be at least 1".into(),
            });
        }
        let gas_price_pct: u32 = parse_or(&get, "TRIBUNAL_GAS_PRICE_PCT", DEFAULT_GAS_PRICE_PCT)?;
        if gas_price_pct < 100 {
            return Err(ConfigError::Invalid {
                var: "TRIBUNAL_GAS_PRICE_PCT".into(),
                reason: format!("{gas_price_pct} would underprice the transaction"),
            });
        }

        Ok(Self {
            client,
            submission_mode: parse_or(&get, "TRIBUNAL_SUBMISSION_MODE", SubmissionMode::default())?,
            batch_policy: parse_or(&get, "TRIBUNAL_BATCH_POLICY", BatchPolicy::default())?,
            model_retry: ModelRetryPolicy {
                max_attempts,
                ..ModelRetryPolicy::default()
            },
            gas_limit: parse_or(&get, "TRIBUNAL_GAS_LIMIT", DEFAULT_GAS_LIMIT)?,
            gas_price_pct,
        })
    }

    /// HTTP timeout shared by every client.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.client.timeout_secs)
    }
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name.to_string(),
            reason: e.to_string(),
        }),
    }
}
