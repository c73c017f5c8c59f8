use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode provider response: {0}")]
    Decode(String),

    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider returned an empty embedding")]
    EmptyEmbedding,

    #[error("missing API key for provider {0}")]
    MissingApiKey(&'static str),
}

impl ProviderError {
    pub fn request<E: std::fmt::Display>(err: E) -> Self {
        ProviderError::Request(err.to_string())
    }

    pub fn decode<E: std::fmt::Display>(err: E) -> Self {
        ProviderError::Decode(err.to_string())
    }

    /// Whether repeating the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Request(_) | ProviderError::Timeout(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Turns text into a dense vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// provider name used in logs (e.g. "gemini", "openai_compat")
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Produces an answer for a fully assembled prompt.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the provider answered without any text.
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ProviderError>;
}

/// Bound a provider call by `limit`, mapping expiry to [`ProviderError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}

/// Decode a JSON number array into an embedding.
///
/// Any non-numeric entry fails the whole vector; `field` names it in the
/// error.
pub(crate) fn decode_embedding(values: &[Value], field: &str) -> Result<Vec<f32>, ProviderError> {
    let vector = values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value.as_f64().map(|f| f as f32).ok_or_else(|| {
                ProviderError::Decode(format!("{}[{}] is not a number: {}", field, index, value))
            })
        })
        .collect::<Result<Vec<f32>, ProviderError>>()?;
    if vector.is_empty() {
        return Err(ProviderError::EmptyEmbedding);
    }
    Ok(vector)
}
