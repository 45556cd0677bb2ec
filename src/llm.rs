use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

/// Inputs per `/embeddings` request.
const EMBED_BATCH: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible chat + embeddings API.
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    embedding_model: String,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Resolve an API route (`chat/completions`, `embeddings`) against the base URL.
    fn endpoint(&self, route: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with(&format!("/{}", route)) {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/{}", base, route)
        } else {
            format!("{}/v1/{}", base, route)
        }
    }

    async fn post(&self, route: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let mut req = self.client.post(self.endpoint(route)).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.context("LLM request failed")?;
        let status = resp.status();
        let text = resp.text().await.context("Failed to read LLM response")?;
        if !status.is_success() {
            let snippet: String = text.chars().take(300).collect();
            anyhow::bail!("{} returned {}: {}", route, status, snippet);
        }
        serde_json::from_str(&text).context("Failed to parse LLM JSON")
    }

    /// Non-streaming chat completion.
    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.7,
        });
        let json = self.post("chat/completions", &body).await?;

        // choices[0].message.content may be null
        let content = json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .unwrap_or("")
            .to_string();

        Ok(content)
    }

    /// Embed `inputs`, preserving their order.
    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(EMBED_BATCH) {
            let body = serde_json::json!({
                "model": self.embedding_model,
                "input": batch,
            });
            let json = self.post("embeddings", &body).await?;
            let mut parsed: EmbeddingResponse =
                serde_json::from_value(json).context("Unexpected embeddings payload")?;
            anyhow::ensure!(
                parsed.data.len() == batch.len(),
                "expected {} embeddings, got {}",
                batch.len(),
                parsed.data.len()
            );
            parsed.data.sort_by_key(|d| d.index);
            out.extend(parsed.data.into_iter().map(|d| d.embedding));
        }
        Ok(out)
    }
}
