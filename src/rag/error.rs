use std::path::PathBuf;

use thiserror::Error;

use crate::llm::ProviderError;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("embedding dimension mismatch: query has {expected}, record has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("inconsistent corpus: {0}")]
    InconsistentCorpus(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid corpus file {path}: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl RagError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RagError::Io {
            path: path.into(),
            source,
        }
    }
}
