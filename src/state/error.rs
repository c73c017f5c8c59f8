use thiserror::Error;

use crate::core::config::ConfigError;
use crate::llm::ProviderError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] ConfigError),

    #[error("Failed to set up model provider: {0}")]
    Provider(#[source] ProviderError),
}
