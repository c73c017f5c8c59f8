pub mod gemini;
pub mod openai_compat;
pub mod provider;
pub mod types;

use std::sync::Arc;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{with_timeout, EmbeddingProvider, GenerationProvider, ProviderError};
pub use types::{ChatMessage, ProviderKind};

use crate::core::config::ProviderConfig;

/// Embedding and generation halves of one configured provider.
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub generator: Arc<dyn GenerationProvider>,
}

impl Providers {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| config.kind.default_base_url().to_string());
        let embedding_model = config
            .embedding_model
            .clone()
            .unwrap_or_else(|| config.kind.default_embedding_model().to_string());
        let generation_model = config
            .generation_model
            .clone()
            .unwrap_or_else(|| config.kind.default_generation_model().to_string());

        match config.kind {
            ProviderKind::Gemini => {
                let provider = Arc::new(GeminiProvider::new(
                    base_url,
                    config.api_key.clone(),
                    embedding_model,
                    generation_model,
                )?);
                Ok(Self {
                    embedder: provider.clone(),
                    generator: provider,
                })
            }
            ProviderKind::OpenaiCompat => {
                let provider = Arc::new(OpenAiCompatProvider::new(
                    base_url,
                    config.api_key.clone(),
                    embedding_model,
                    generation_model,
                ));
                Ok(Self {
                    embedder: provider.clone(),
                    generator: provider,
                })
            }
        }
    }
}
