//! # tribunal-client -- HTTP clients for the arbitration workflow
//!
//! Typed access to every external service a run touches:
//! - **Evidence store** (`GET`/`POST /evidence/{disputeId}/{a|b}`, bearer auth)
//! - **Model vendors** (OpenAI-, Anthropic- and Gemini-style chat endpoints)
//! - **Ethereum JSON-RPC** (`eth_call`, nonce, gas price, raw transaction broadcast)
//!
//! All clients share the timeout from [`ClientConfig`] and keep credentials
//! out of `Debug` output.

pub mod config;
pub mod error;
pub mod evidence;
pub mod models;
pub mod rpc;

pub use config::{ClientConfig, ConfigError, EvidenceStoreConfig, ModelConfig};
pub use error::ClientError;
pub use evidence::EvidenceClient;
pub use models::{HttpModelBackend, ModelBackend, ModelPanel, Provider};
pub use rpc::ChainRpcClient;

use std::time::Duration;

use url::Url;

/// Build a `reqwest::Client` with the given request timeout.
pub fn build_http(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Http {
            endpoint: "client_init".into(),
            source: e,
        })
}

/// Append `path` to `base`, tolerating a trailing slash on the base.
pub(crate) fn join_url(base: &Url, path: &str) -> String {
    format!("{}/{}", base.as_str().trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_trailing_slash() {
        let a: Url = "http://127.0.0.1:9000".parse().unwrap();
        let b: Url = "http://127.0.0.1:9000/store/".parse().unwrap();
        assert_eq!(join_url(&a, "evidence/x/a"), "http://127.0.0.1:9000/evidence/x/a");
        assert_eq!(join_url(&b, "evidence/x/a"), "http://127.0.0.1:9000/store/evidence/x/a");
    }
}
