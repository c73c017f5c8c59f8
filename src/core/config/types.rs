use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::llm::ProviderKind;
use crate::rag::chunker::DEFAULT_MAX_CHARS;
use crate::rag::ranker::DEFAULT_TOP_K;

/// Typed view of the merged `config.yml` + `secrets.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub corpus: CorpusConfig,
    pub ingest: IngestConfig,
    pub query: QueryConfig,
    pub providers: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Corpus file; defaults to `<data_dir>/embeddings.json`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory to walk; defaults to `<project_root>/../frontend/src`.
    pub source_dir: Option<PathBuf>,
    /// Directory chunk paths are made relative to; defaults to the parent of `source_dir`.
    pub base_dir: Option<PathBuf>,
    pub patterns: Vec<String>,
    pub max_chars: usize,
    pub concurrency: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            base_dir: None,
            patterns: vec!["**/*.{ts,tsx,js,jsx,html,css,scss}".to_string()],
            max_chars: DEFAULT_MAX_CHARS,
            concurrency: 4,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub top_k: usize,
    /// What the assistant is told it answers questions about.
    pub subject: String,
    pub max_question_chars: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            subject: "a React codebase".to_string(),
            max_question_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub embedding_model: Option<String>,
    pub generation_model: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: None,
            api_key: None,
            embedding_model: None,
            generation_model: None,
            timeout_secs: 30,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
