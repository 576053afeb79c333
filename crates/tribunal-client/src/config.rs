//! Client configuration.
//!
//! Everything is read from `TRIBUNAL_*` environment variables. Secrets are
//! held in [`Zeroizing`] buffers and redacted from `Debug` output.

use std::fmt;
use std::str::FromStr;

use url::Url;
use zeroize::Zeroizing;

use tribunal_core::Address;

use crate::models::Provider;

/// Default EIP-155 chain id (Sepolia).
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// Default HTTP timeout for every client.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_PROVIDERS: [Provider; 3] = [Provider::OpenAi, Provider::Anthropic, Provider::Gemini];
const DEFAULT_MODEL_IDS: [&str; 3] = ["gpt-4o", "claude-3-5-sonnet", "gemini-1.5-pro"];

/// One arbitrator backend.
#[derive(Clone)]
pub struct ModelConfig {
    /// Vendor dialect.
    pub provider: Provider,
    /// Registered model id. Hashed into the verdict.
    pub model_id: String,
    /// Model name sent in the vendor request.
    pub model_name: String,
    /// Vendor base URL.
    pub base_url: Url,
    /// Vendor API key.
    pub api_key: Zeroizing<String>,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("model_id", &self.model_id)
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// The private evidence store.
#[derive(Clone)]
pub struct EvidenceStoreConfig {
    /// Base URL.
    pub url: Url,
    /// Bearer token.
    pub token: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl fmt::Debug for EvidenceStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvidenceStoreConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl EvidenceStoreConfig {
    /// Load `TRIBUNAL_EVIDENCE_URL`, `TRIBUNAL_EVIDENCE_TOKEN` and
    /// `TRIBUNAL_TIMEOUT_SECS` only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Env(&lookup).evidence_store()
    }
}

/// Endpoints and credentials for every external service the workflow talks to.
///
/// Custom `Debug` implementation redacts the evidence token and API keys.
#[derive(Clone)]
pub struct ClientConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Contract answering `getDispute` / `getEscrow`.
    pub registry_address: Address,
    /// Contract receiving `submitVerdict`.
    pub verifier_address: Address,
    /// Evidence store endpoint and credential.
    pub evidence: EvidenceStoreConfig,
    /// The three arbitrators in registration order.
    pub models: [ModelConfig; 3],
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field("registry_address", &self.registry_address)
            .field("verifier_address", &self.verifier_address)
            .field("evidence", &self.evidence)
            .field("models", &self.models)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `TRIBUNAL_RPC_URL` (required)
    /// - `TRIBUNAL_CHAIN_ID` (default: 11155111)
    /// - `TRIBUNAL_REGISTRY_ADDRESS`, `TRIBUNAL_VERIFIER_ADDRESS` (required)
    /// - `TRIBUNAL_EVIDENCE_URL`, `TRIBUNAL_EVIDENCE_TOKEN` (required)
    /// - `TRIBUNAL_MODEL{1,2,3}_{PROVIDER,ID,NAME,URL}` (defaults per slot)
    /// - `TRIBUNAL_MODEL{1,2,3}_API_KEY` (required)
    /// - `TRIBUNAL_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);
        let models = [env.model(1)?, env.model(2)?, env.model(3)?];
        Ok(Self {
            rpc_url: env.url("TRIBUNAL_RPC_URL", None)?,
            chain_id: env.parsed("TRIBUNAL_CHAIN_ID", DEFAULT_CHAIN_ID)?,
            registry_address: env.address("TRIBUNAL_REGISTRY_ADDRESS")?,
            verifier_address: env.address("TRIBUNAL_VERIFIER_ADDRESS")?,
            evidence: env.evidence_store()?,
            models,
            timeout_secs: env.parsed("TRIBUNAL_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

/// Typed accessors over a variable lookup.
struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &str) -> Result<String, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::Missing(name.to_string()))
    }

    fn secret(&self, name: &str) -> Result<Zeroizing<String>, ConfigError> {
        self.required(name).map(Zeroizing::new)
    }

    fn url(&self, name: &str, default: Option<&str>) -> Result<Url, ConfigError> {
        let raw = match (self.get(name), default) {
            (Some(v), _) => v,
            (None, Some(d)) => d.to_string(),
            (None, None) => return Err(ConfigError::Missing(name.to_string())),
        };
        Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
    }

    fn address(&self, name: &str) -> Result<Address, ConfigError> {
        Address::from_hex(&self.required(name)?).map_err(|e| ConfigError::Invalid {
            var: name.to_string(),
            reason: e.to_string(),
        })
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn evidence_store(&self) -> Result<EvidenceStoreConfig, ConfigError> {
        Ok(EvidenceStoreConfig {
            url: self.url("TRIBUNAL_EVIDENCE_URL", None)?,
            token: self.secret("TRIBUNAL_EVIDENCE_TOKEN")?,
            timeout_secs: self.parsed("TRIBUNAL_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }

    fn model(&self, slot: usize) -> Result<ModelConfig, ConfigError> {
        let var = |field: &str| format!("TRIBUNAL_MODEL{slot}_{field}");
        let provider = self.parsed(&var("PROVIDER"), DEFAULT_PROVIDERS[slot - 1])?;
        let model_id = self
            .get(&var("ID"))
            .unwrap_or_else(|| DEFAULT_MODEL_IDS[slot - 1].to_string());
        let model_name = self.get(&var("NAME")).unwrap_or_else(|| model_id.clone());
        Ok(ModelConfig {
            provider,
            base_url: self.url(&var("URL"), Some(provider.default_base_url()))?,
            api_key: self.secret(&var("API_KEY"))?,
            model_id,
            model_name,
        })
    }
}

/// Configuration errors. Raised before any network I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(String),
    #[error("invalid URL in {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value in {var}: {reason}")]
    Invalid { var: String, reason: String },
}
