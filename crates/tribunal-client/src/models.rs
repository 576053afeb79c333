//! # Model Backends
//!
//! Each arbitrator is an HTTP chat-completion endpoint. The three supported
//! vendor dialects differ only in path, auth header and response envelope;
//! the prompt pair is identical across all of them.
//!
//! A backend never fails: every outcome, including timeouts and auth
//! errors, is returned as a [`RawModelResponse`] and normalized later by
//! `parse_model_response`. No retries happen here.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::json;
use url::Url;
use zeroize::Zeroizing;

use tribunal_arbitration::{ArbitrationPrompt, RawModelResponse};

use crate::config::ModelConfig;
use crate::error::ClientError;

/// `anthropic-version` header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Output token cap sent to vendors that require one.
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Vendor API dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// `POST /v1/chat/completions`, bearer auth.
    OpenAi,
    /// `POST /v1/messages`, `x-api-key` auth.
    Anthropic,
    /// `POST /v1beta/models/{model}:generateContent`, `x-goog-api-key` auth.
    Gemini,
}

impl Provider {
    /// Public API base URL.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com",
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    /// Configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(format!(
                "unknown provider \"{other}\" (expected openai, anthropic or gemini)"
            )),
        }
    }
}

/// One arbitrator.
#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    /// Registered model id, hashed into the verdict.
    fn model_id(&self) -> &str;

    /// Send the prompt pair and return the raw answer or the failure.
    async fn query(&self, prompt: &ArbitrationPrompt) -> RawModelResponse;
}

/// A vendor HTTP backend.
pub struct HttpModelBackend {
    http: reqwest::Client,
    provider: Provider,
    model_id: String,
    model_name: String,
    base_url: Url,
    api_key: Zeroizing<String>,
}

impl fmt::Debug for HttpModelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpModelBackend")
            .field("provider", &self.provider)
            .field("model_id", &self.model_id)
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpModelBackend {
    /// Create a backend sharing `http`.
    pub fn new(http: reqwest::Client, config: &ModelConfig) -> Self {
        Self {
            http,
            provider: config.provider,
            model_id: config.model_id.clone(),
            model_name: config.model_name.clone(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// The vendor dialect.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    fn request(&self, prompt: &ArbitrationPrompt) -> reqwest::RequestBuilder {
        let system = prompt.system_prompt();
        let user = prompt.user_prompt();
        match self.provider {
            Provider::OpenAi => self
                .http
                .post(crate::join_url(&self.base_url, "v1/chat/completions"))
                .bearer_auth(self.api_key.as_str())
                .json(&json!({
                    "model": self.model_name,
                    "temperature": 0,
                    "response_format": { "type": "json_object" },
                    "messages": [
                        { "role": "system", "content": system },
                        { "role": "user", "content": user },
                    ],
                })),
            Provider::Anthropic => self
                .http
                .post(crate::join_url(&self.base_url, "v1/messages"))
                .header("x-api-key", self.api_key.as_str())
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&json!({
                    "model": self.model_name,
                    "max_tokens": MAX_OUTPUT_TOKENS,
                    "temperature": 0,
                    "system": system,
                    "messages": [{ "role": "user", "content": user }],
                })),
            Provider::Gemini => self
                .http
                .post(crate::join_url(
                    &self.base_url,
                    &format!("v1beta/models/{}:generateContent", self.model_name),
                ))
                .header("x-goog-api-key", self.api_key.as_str())
                .json(&json!({
                    "systemInstruction": { "parts": [{ "text": system }] },
                    "contents": [{ "role": "user", "parts": [{ "text": user }] }],
                    "generationConfig": {
                        "temperature": 0,
                        "maxOutputTokens": MAX_OUTPUT_TOKENS,
                        "responseMimeType": "application/json",
                    },
                })),
        }
    }

    async fn call(&self, prompt: &ArbitrationPrompt) -> Result<String, ClientError> {
        let endpoint = format!("{} {}", self.provider, self.model_name);
        let resp = self
            .request(prompt)
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

        let text = match self.provider {
            Provider::OpenAi => resp
                .json::<ChatCompletion>()
                .await
                .map(ChatCompletion::into_text),
            Provider::Anthropic => resp.json::<Messages>().await.map(Messages::into_text),
            Provider::Gemini => resp
                .json::<GenerateContent>()
                .await
                .map(GenerateContent::into_text),
        }
        .map_err(|e| ClientError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        text.ok_or_else(|| ClientError::InvalidResponse {
            endpoint,
            reason: "response envelope carries no text".into(),
        })
    }
}

#[async_trait::async_trait]
impl ModelBackend for HttpModelBackend {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn query(&self, prompt: &ArbitrationPrompt) -> RawModelResponse {
        let started = Instant::now();
        let result = self.call(prompt).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(text) => {
                tracing::info!(
                    model_id = %self.model_id,
                    provider = %self.provider,
                    duration_ms,
                    response_len = text.len(),
                    "model responded"
                );
                RawModelResponse::success(&self.model_id, text, duration_ms)
            }
            Err(e) => {
                tracing::warn!(
                    model_id = %self.model_id,
                    provider = %self.provider,
                    duration_ms,
                    "model call failed: {e}"
                );
                RawModelResponse::failure(&self.model_id, e.to_string(), duration_ms)
            }
        }
    }
}

// -- Vendor response envelopes ----------------------------------------------

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletion {
    fn into_text(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

#[derive(Deserialize)]
struct Messages {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl Messages {
    fn into_text(self) -> Option<String> {
        self.content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
    }
}

#[derive(Deserialize)]
struct GenerateContent {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContent {
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

// -- Panel ------------------------------------------------------------------

/// Exactly three arbitrators in registration order.
#[derive(Clone)]
pub struct ModelPanel {
    backends: [Arc<dyn ModelBackend>; 3],
}

impl fmt::Debug for ModelPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPanel")
            .field("models", &self.model_ids())
            .finish()
    }
}

impl ModelPanel {
    /// Panel over three backends, in registration order.
    pub fn new(backends: [Arc<dyn ModelBackend>; 3]) -> Self {
        Self { backends }
    }

    /// Build HTTP backends sharing one client with the given timeout.
    pub fn from_configs(models: &[ModelConfig; 3], timeout: Duration) -> Result<Self, ClientError> {
        let http = crate::build_http(timeout)?;
        let backend = |config: &ModelConfig| -> Arc<dyn ModelBackend> {
            Arc::new(HttpModelBackend::new(http.clone(), config))
        };
        Ok(Self::new([
            backend(&models[0]),
            backend(&models[1]),
            backend(&models[2]),
        ]))
    }

    /// Replace every backend with `wrap(backend)`, preserving order.
    pub fn map<F>(self, wrap: F) -> Self
    where
        F: Fn(Arc<dyn ModelBackend>) -> Arc<dyn ModelBackend>,
    {
        let [a, b, c] = self.backends;
        Self::new([wrap(a), wrap(b), wrap(c)])
    }

    /// Registered model ids.
    pub fn model_ids(&self) -> [&str; 3] {
        [
            self.backends[0].model_id(),
            self.backends[1].model_id(),
            self.backends[2].model_id(),
        ]
    }

    /// Query all three concurrently. Results come back in registration
    /// order regardless of completion order.
    pub async fn query_all(&self, prompt: &ArbitrationPrompt) -> [RawModelResponse; 3] {
        let (a, b, c) = tokio::join!(
            self.backends[0].query(prompt),
            self.backends[1].query(prompt),
            self.backends[2].query(prompt),
        );
        [a, b, c]
    }
}
