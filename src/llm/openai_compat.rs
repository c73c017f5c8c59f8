use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{decode_embedding, EmbeddingProvider, GenerationProvider, ProviderError};
use super::types::ChatMessage;

/// Client for any server exposing the OpenAI `/v1/embeddings` and
/// `/v1/chat/completions` endpoints (LM Studio, Ollama, OpenAI itself).
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
    generation_model: String,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        embedding_model: String,
        generation_model: String,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            embedding_model,
            generation_model,
            client: Client::new(),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await.map_err(ProviderError::request)?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        res.json().await.map_err(ProviderError::decode)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai_compat"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let body = json!({
            "model": self.embedding_model,
            "input": [text],
        });
        let payload = self.post("/v1/embeddings", &body).await?;
        parse_embedding(&payload)
    }
}

#[async_trait]
impl GenerationProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai_compat"
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        let body = json!({
            "model": self.generation_model,
            "messages": [ChatMessage::user(prompt)],
            "stream": false,
        });
        let payload = self.post("/v1/chat/completions", &body).await?;
        Ok(parse_completion(&payload))
    }
}

fn parse_embedding(payload: &Value) -> Result<Vec<f32>, ProviderError> {
    let values = payload["data"][0]["embedding"]
        .as_array()
        .ok_or_else(|| ProviderError::Decode("missing data[0].embedding".to_string()))?;

    decode_embedding(values, "data[0].embedding")
}

fn parse_completion(payload: &Value) -> Option<String> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
}
