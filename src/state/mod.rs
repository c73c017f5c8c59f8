use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::llm::Providers;
use crate::query::{QueryOptions, QueryService};
use crate::rag::CorpusHandle;

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// The corpus inside `query` is read-only for request handlers; only the
/// reload endpoint replaces it, as a whole.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: Arc<AppConfig>,
    pub query: QueryService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// 1. Loads and validates configuration
    /// 2. Builds the embedding/generation provider
    /// 3. Loads the corpus file (missing or broken files yield an empty corpus)
    pub fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config_service = ConfigService::new(paths.clone());
        let config = config_service
            .load()
            .map_err(InitializationError::Config)?;

        if let Ok(raw) = config_service.load_config() {
            tracing::debug!(
                "Effective config: {}",
                config_service.redact_sensitive_values(&raw)
            );
        }

        let providers =
            Providers::from_config(&config.providers).map_err(InitializationError::Provider)?;
        tracing::info!(
            "Using {} for embeddings and {} for generation",
            providers.embedder.name(),
            providers.generator.name()
        );

        let corpus = CorpusHandle::open(corpus_path(&paths, &config));

        Ok(Arc::new(Self::from_parts(paths, config, corpus, providers)))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: AppConfig,
        corpus: CorpusHandle,
        providers: Providers,
    ) -> Self {
        let query = QueryService::new(corpus, providers, QueryOptions::from_config(&config));
        Self {
            paths,
            config: Arc::new(config),
            query,
            started_at: Utc::now(),
        }
    }

    pub fn corpus(&self) -> &CorpusHandle {
        self.query.corpus()
    }
}

/// Configured corpus file, or `<data_dir>/embeddings.json`.
pub fn corpus_path(paths: &AppPaths, config: &AppConfig) -> std::path::PathBuf {
    config
        .corpus
        .path
        .as_deref()
        .map(|p| paths.resolve(p))
        .unwrap_or_else(|| paths.default_corpus_path())
}
