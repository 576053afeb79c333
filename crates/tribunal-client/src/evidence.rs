//! Typed client for the private evidence store.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/evidence/{disputeId}/{a\|b}` | Fetch one party's evidence |
//! | POST   | `/evidence/{disputeId}/{a\|b}` | Submit evidence (write-once) |
//!
//! The client only moves bytes. Integrity against the on-chain commitment
//! is checked by `Evidence::verify` in the workflow's fetcher.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::Zeroizing;

use tribunal_arbitration::{evidence_commitment, EvidenceDocument, Party};
use tribunal_core::{Address, Bytes32};

use crate::config::EvidenceStoreConfig;
use crate::error::ClientError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitEvidenceRequest<'a> {
    content: &'a str,
    party_address: Address,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitEvidenceResponse {
    content_hash: Bytes32,
}

/// Bearer-authenticated evidence store client.
#[derive(Clone)]
pub struct EvidenceClient {
    http: reqwest::Client,
    base_url: Url,
    token: Zeroizing<String>,
}

impl fmt::Debug for EvidenceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvidenceClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl EvidenceClient {
    /// Create a client with its own connection pool.
    pub fn new(base_url: Url, token: Zeroizing<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self::with_http(crate::build_http(timeout)?, base_url, token))
    }

    /// Create a client from configuration.
    pub fn from_config(config: &EvidenceStoreConfig) -> Result<Self, ClientError> {
        Self::new(
            config.url.clone(),
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a client over an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, base_url: Url, token: Zeroizing<String>) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    fn url(&self, dispute_id: &Bytes32, party: Party) -> String {
        crate::join_url(
            &self.base_url,
            &format!("evidence/{dispute_id}/{}", party.path_segment()),
        )
    }

    /// Fetch one party's evidence document.
    ///
    /// Calls `GET {base_url}/evidence/{disputeId}/{a|b}`. Any non-2xx status
    /// means the party has not submitted.
    pub async fn fetch(&self, dispute_id: &Bytes32, party: Party) -> Result<EvidenceDocument, ClientError> {
        let endpoint = format!("GET /evidence/{dispute_id}/{}", party.path_segment());
        let resp = self
            .http
            .get(self.url(dispute_id, party))
            .bearer_auth(self.token.as_str())
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(ClientError::EvidenceNotSubmitted {
                party,
                status: resp.status().as_u16(),
            });
        }

        let document: EvidenceDocument = resp.json().await.map_err(|e| ClientError::Deserialization {
            endpoint,
            source: e,
        })?;
        tracing::debug!(
            dispute_id = %dispute_id,
            %party,
            content_len = document.content.len(),
            submitted_at = document.submitted_at,
            "evidence fetched"
        );
        Ok(document)
    }

    /// Submit evidence for one party and return the commitment to record
    /// on-chain.
    ///
    /// Calls `POST {base_url}/evidence/{disputeId}/{a|b}`. The store's
    /// `contentHash` must match the locally computed keccak-256; a second
    /// submission for the same slot is refused by the store (409).
    pub async fn submit(
        &self,
        dispute_id: &Bytes32,
        party: Party,
        party_address: Address,
        content: &str,
    ) -> Result<Bytes32, ClientError> {
        let endpoint = format!("POST /evidence/{dispute_id}/{}", party.path_segment());
        let resp = self
            .http
            .post(self.url(dispute_id, party))
            .bearer_auth(self.token.as_str())
            .json(&SubmitEvidenceRequest {
                content,
                party_address,
            })
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                endpoint,
                status,
                body,
            });
        }

        let answer: SubmitEvidenceResponse =
            resp.json().await.map_err(|e| ClientError::Deserialization {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        let expected = evidence_commitment(content);
        if answer.content_hash != expected {
            return Err(ClientError::InvalidResponse {
                endpoint,
                reason: format!(
                    "store reported contentHash {} but content hashes to {expected}",
                    answer.content_hash
                ),
            });
        }
        tracing::info!(dispute_id = %dispute_id, %party, content_hash = %expected, "evidence submitted");
        Ok(expected)
    }
}
