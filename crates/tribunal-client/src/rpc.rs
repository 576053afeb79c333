//! Minimal Ethereum JSON-RPC client.
//!
//! Covers exactly the calls the workflow makes: `eth_call`,
//! `eth_getTransactionCount`, `eth_gasPrice` and `eth_sendRawTransaction`.
//! JSON-RPC error objects are surfaced verbatim as [`ClientError::Rpc`].
//! There is no retry; RPC failures are fatal to the run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use tribunal_core::{Address, Bytes32};

use crate::error::ClientError;

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client over HTTP.
#[derive(Debug)]
pub struct ChainRpcClient {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl ChainRpcClient {
    /// Create a client with its own connection pool.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self::with_http(crate::build_http(timeout)?, url))
    }

    /// Create a client over an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, url: Url) -> Self {
        Self {
            http,
            url,
            next_id: AtomicU64::new(1),
        }
    }

    /// Issue one request and deserialize its `result`.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let resp = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: method.to_string(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                endpoint: method.to_string(),
                status,
                body,
            });
        }

        let envelope: RpcResponse<T> = resp.json().await.map_err(|e| ClientError::Deserialization {
            endpoint: method.to_string(),
            source: e,
        })?;

        if let Some(err) = envelope.error {
            tracing::warn!(method, code = err.code, "JSON-RPC error: {}", err.message);
            return Err(ClientError::Rpc {
                method: method.to_string(),
                code: err.code,
                message: err.message,
            });
        }
        envelope.result.ok_or_else(|| ClientError::InvalidResponse {
            endpoint: method.to_string(),
            reason: "response has neither result nor error".into(),
        })
    }

    /// `eth_call` against the latest block; returns the raw return data.
    pub async fn eth_call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, ClientError> {
        let result: String = self
            .request(
                "eth_call",
                json!([{ "to": to.to_hex(), "data": format!("0x{}", hex::encode(data)) }, "latest"]),
            )
            .await?;
        decode_hex_data("eth_call", &result)
    }

    /// Pending nonce of `address`.
    pub async fn transaction_count(&self, address: &Address) -> Result<u64, ClientError> {
        let result: String = self
            .request("eth_getTransactionCount", json!([address.to_hex(), "pending"]))
            .await?;
        let value = parse_quantity("eth_getTransactionCount", &result)?;
        u64::try_from(value).map_err(|_| ClientError::InvalidResponse {
            endpoint: "eth_getTransactionCount".into(),
            reason: format!("nonce {value} overflows u64"),
        })
    }

    /// Current gas price in wei.
    pub async fn gas_price(&self) -> Result<u128, ClientError> {
        let result: String = self.request("eth_gasPrice", json!([])).await?;
        parse_quantity("eth_gasPrice", &result)
    }

    /// Broadcast a signed raw transaction; returns its hash.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<Bytes32, ClientError> {
        let result: String = self
            .request(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(raw))]),
            )
            .await?;
        Bytes32::from_hex(&result).map_err(|e| ClientError::InvalidResponse {
            endpoint: "eth_sendRawTransaction".into(),
            reason: e.to_string(),
        })
    }
}

/// Parse a JSON-RPC hex quantity (`0x`-prefixed, no leading zeros required).
pub fn parse_quantity(method: &str, s: &str) -> Result<u128, ClientError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|e| ClientError::InvalidResponse {
        endpoint: method.to_string(),
        reason: format!("bad quantity {s:?}: {e}"),
    })
}

fn decode_hex_data(method: &str, s: &str) -> Result<Vec<u8>, ClientError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|e| ClientError::InvalidResponse {
        endpoint: method.to_string(),
        reason: format!("bad hex data: {e}"),
    })
}
