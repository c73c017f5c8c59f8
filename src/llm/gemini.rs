use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{decode_embedding, EmbeddingProvider, GenerationProvider, ProviderError};

const API_VERSION: &str = "v1beta";

/// Google Generative Language REST client (`embedContent` / `generateContent`).
#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    embedding_model: String,
    generation_model: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        embedding_model: String,
        generation_model: String,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingApiKey("gemini"))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model,
            generation_model,
            client: Client::new(),
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/{}/models/{}:{}",
            self.base_url, API_VERSION, model, method
        )
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, ProviderError> {
        let res = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(ProviderError::request)?;

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
impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = self.model_url(&self.embedding_model, "embedContent");
        let body = json!({
            "model": format!("models/{}", self.embedding_model),
            "content": { "parts": [{ "text": text }] },
        });
        let payload = self.post(&url, &body).await?;
        parse_embedding(&payload)
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        let url = self.model_url(&self.generation_model, "generateContent");
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        let payload = self.post(&url, &body).await?;
        Ok(parse_candidate_text(&payload))
    }
}

fn parse_embedding(payload: &Value) -> Result<Vec<f32>, ProviderError> {
    let values = payload["embedding"]["values"]
        .as_array()
        .ok_or_else(|| ProviderError::Decode("missing embedding.values".to_string()))?;

    decode_embedding(values, "embedding.values")
}

/// Concatenated text parts of the first candidate, `None` if there are none.
fn parse_candidate_text(payload: &Value) -> Option<String> {
    let parts = payload["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_api_key() {
        let result = GeminiProvider::new(
            "https://example.test".to_string(),
            Some("  ".to_string()),
            "text-embedding-004".to_string(),
            "gemini-2.5-flash".to_string(),
        );
        assert!(matches!(result, Err(ProviderError::MissingApiKey("gemini"))));
    }

    #[test]
    fn builds_model_method_urls() {
        let provider = GeminiProvider::new(
            "https://example.test/".to_string(),
            Some("key".to_string()),
            "text-embedding-004".to_string(),
            "gemini-2.5-flash".to_string(),
        )
        .unwrap();
        assert_eq!(
            provider.model_url("text-embedding-004", "embedContent"),
            "https://example.test/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn parses_embedding_values() {
        let payload = json!({ "embedding": { "values": [0.25, 0.5] } });
        assert_eq!(parse_embedding(&payload).unwrap(), vec![0.25, 0.5]);
        assert!(matches!(
            parse_embedding(&json!({ "embedding": { "values": [] } })),
            Err(ProviderError::EmptyEmbedding)
        ));
    }

    #[test]
    fn joins_candidate_parts() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "See " }, { "text": "Chat.jsx" }] }
            }]
        });
        assert_eq!(parse_candidate_text(&payload).as_deref(), Some("See Chat.jsx"));
        assert_eq!(parse_candidate_text(&json!({ "candidates": [] })), None);
    }

    #[test]
    fn non_numeric_values_reject_the_embedding() {
        let payload = json!({ "embedding": { "values": [0.25, null, 0.5] } });
        assert!(matches!(
            parse_embedding(&payload),
            Err(ProviderError::Decode(_))
        ));
    }
}
