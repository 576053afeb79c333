//! Retry wrapper for model backends.
//!
//! Retries only transport failures (a [`RawModelResponse`] carrying an
//! error). A response that arrived but does not parse is returned as-is and
//! becomes a circuit-breaker vote; retrying it would let a model re-roll its
//! answer.

use std::sync::Arc;

use tribunal_arbitration::{ArbitrationPrompt, RawModelResponse};
use tribunal_client::ModelBackend;

use crate::config::ModelRetryPolicy;

/// A [`ModelBackend`] that retries transport failures with exponential backoff.
pub struct RetryingBackend {
    inner: Arc<dyn ModelBackend>,
    policy: ModelRetryPolicy,
}

impl RetryingBackend {
    pub fn new(inner: Arc<dyn ModelBackend>, policy: ModelRetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl ModelBackend for RetryingBackend {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn query(&self, prompt: &ArbitrationPrompt) -> RawModelResponse {
        let attempts = self.policy.max_attempts.max(1);
        let mut retry = 0;
        loop {
            let response = self.inner.query(prompt).await;
            if response.error.is_none() || retry + 1 >= attempts {
                return response;
            }
            let delay = self.policy.delay(retry);
            tracing::warn!(
                model_id = %self.model_id(),
                attempt = retry + 1,
                max_attempts = attempts,
                "model call failed, retrying in {delay:?}: {}",
                response.error.as_deref().unwrap_or_default()
            );
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }
}
