//! Corpus records, the flat JSON corpus file and the shared in-memory handle.
//!
//! The corpus file is a JSON array of `{file, text, embedding}` objects in
//! build order. The service loads it once and shares it read-only; a reload
//! replaces the whole corpus in one swap.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::error::RagError;
use super::ranker::{self, RankedResult};

/// One embedded chunk of a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Path relative to the ingest base directory, `/`-separated.
    pub file: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Validated, ordered collection of chunk records.
///
/// Every record carries a non-empty embedding and all embeddings share one
/// dimension.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<ChunkRecord>,
    dimension: Option<usize>,
}

impl Corpus {
    pub fn new(records: Vec<ChunkRecord>) -> Result<Self, RagError> {
        let mut dimension = None;
        for (idx, record) in records.iter().enumerate() {
            let len = record.embedding.len();
            if len == 0 {
                return Err(RagError::InconsistentCorpus(format!(
                    "record {} ({}) has an empty embedding",
                    idx, record.file
                )));
            }
            match dimension {
                None => dimension = Some(len),
                Some(expected) if expected != len => {
                    return Err(RagError::InconsistentCorpus(format!(
                        "record {} ({}) has dimension {}, expected {}",
                        idx, record.file, len, expected
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(Self { records, dimension })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ChunkRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ChunkRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Embedding dimension shared by all records, `None` when empty.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Top `k` records by cosine similarity to `query`.
    ///
    /// An empty corpus yields no results regardless of the query.
    pub fn rank(&self, query: &[f32], k: usize) -> Result<Vec<RankedResult>, RagError> {
        if self.records.is_empty() {
            return Ok(Vec::new());
        }
        ranker::rank(query, &self.records, k)
    }

    pub fn load(path: &Path) -> Result<Self, RagError> {
        let raw = fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
        let records: Vec<ChunkRecord> =
            serde_json::from_str(&raw).map_err(|source| RagError::Serde {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(records)
    }

    /// Load `path`, falling back to an empty corpus when it is missing or broken.
    pub fn load_or_empty(path: &Path) -> Self {
        if !path.exists() {
            tracing::warn!(
                "Corpus file {} not found; serving with an empty corpus",
                path.display()
            );
            return Self::empty();
        }
        match Self::load(path) {
            Ok(corpus) => corpus,
            Err(err) => {
                tracing::error!("Failed to load corpus: {}; serving with an empty corpus", err);
                Self::empty()
            }
        }
    }
}

/// How a build run treats an existing corpus file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Replace whatever is there.
    #[default]
    Overwrite,
    /// Keep existing records and add the new ones after them. Re-ingesting
    /// the same files this way duplicates their records.
    Append,
}

/// Write `records` to `path` and return the number of records in the file.
///
/// The file is written to a temporary sibling and renamed into place, so a
/// failure never leaves a partial corpus behind.
pub fn persist(path: &Path, records: Vec<ChunkRecord>, mode: WriteMode) -> Result<usize, RagError> {
    let mut all = match mode {
        WriteMode::Append if path.exists() => Corpus::load(path)?.into_records(),
        _ => Vec::new(),
    };
    all.extend(records);
    let corpus = Corpus::new(all)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RagError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(corpus.records()).map_err(|source| RagError::Serde {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp_path = temp_sibling(path);
    fs::write(&tmp_path, json).map_err(|e| RagError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| RagError::io(path, e))?;

    Ok(corpus.len())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Clone)]
struct Loaded {
    corpus: Arc<Corpus>,
    loaded_at: DateTime<Utc>,
}

/// Shared read-only corpus with whole-value replacement.
///
/// Readers take a snapshot (`Arc<Corpus>`) and keep using it for the rest of
/// their request even if a reload happens meanwhile.
#[derive(Clone)]
pub struct CorpusHandle {
    inner: Arc<RwLock<Loaded>>,
    source: PathBuf,
}

impl CorpusHandle {
    pub fn new(corpus: Corpus, source: PathBuf) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Loaded {
                corpus: Arc::new(corpus),
                loaded_at: Utc::now(),
            })),
            source,
        }
    }

    /// Handle over `source`, loaded leniently (see [`Corpus::load_or_empty`]).
    pub fn open(source: PathBuf) -> Self {
        let corpus = Corpus::load_or_empty(&source);
        tracing::info!(
            "Loaded {} corpus records from {}",
            corpus.len(),
            source.display()
        );
        Self::new(corpus, source)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub async fn snapshot(&self) -> Arc<Corpus> {
        self.inner.read().await.corpus.clone()
    }

    /// Current corpus together with the time it was swapped in, read under
    /// one lock so both describe the same corpus.
    pub async fn snapshot_with_time(&self) -> (Arc<Corpus>, DateTime<Utc>) {
        let loaded = self.inner.read().await;
        (loaded.corpus.clone(), loaded.loaded_at)
    }

    pub async fn replace(&self, corpus: Corpus) -> Arc<Corpus> {
        let corpus = Arc::new(corpus);
        let next = Loaded {
            corpus: corpus.clone(),
            loaded_at: Utc::now(),
        };
        *self.inner.write().await = next;
        corpus
    }

    /// Re-read the source file strictly and swap it in.
    ///
    /// On error the current corpus stays in place.
    pub async fn reload(&self) -> Result<Arc<Corpus>, RagError> {
        let source = self.source.clone();
        let corpus = tokio::task::spawn_blocking(move || Corpus::load(&source))
            .await
            .map_err(|e| RagError::io(&self.source, std::io::Error::other(e)))??;
        Ok(self.replace(corpus).await)
    }
}
