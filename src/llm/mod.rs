//! Generation provider seam.
//!
//! Mirrors the embedding seam: the chat pipeline talks to a `Generator`
//! trait, the production implementation is an OpenAI-style chat completions
//! client. When no credential is configured the pipeline runs in an explicit
//! offline mode and substitutes [`placeholder_answer`] instead of calling out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::errors::RagError;

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, RagError>;
}

/// Answer returned when generation is unavailable. The prompt is still built
/// and reported so the caller can see exactly what would have been sent.
pub fn placeholder_answer() -> String {
    "[Simulated response] No generation service is reachable. \
     Answer the question by prioritizing the user feedback above over the raw documents."
        .to_string()
}

#[derive(Clone)]
pub struct OpenAiGenerator {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiGenerator {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::internal)?;

        Ok(OpenAiGenerator {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "stream": false,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| RagError::GenerationUnavailable(err.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let detail = res.text().await.unwrap_or_default();
            return Err(RagError::GenerationUnavailable(format!(
                "{status}: {detail}"
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|err| RagError::GenerationUnavailable(err.to_string()))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }
}
