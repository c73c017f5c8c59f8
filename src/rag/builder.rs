//! Offline corpus construction: walk, chunk, embed.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use super::chunker::{chunk_text, DEFAULT_MAX_CHARS};
use super::error::RagError;
use super::store::{ChunkRecord, Corpus};
use crate::core::config::IngestConfig;
use crate::llm::{with_timeout, EmbeddingProvider, ProviderError};

/// Settings for one build run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub root_dir: PathBuf,
    /// Defaults to the parent of `root_dir`.
    pub base_dir: Option<PathBuf>,
    pub patterns: Vec<String>,
    pub max_chars: usize,
    /// Maximum embedding requests in flight.
    pub concurrency: usize,
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every further attempt.
    pub retry_backoff: Duration,
    pub timeout: Duration,
}

impl BuildOptions {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let defaults = IngestConfig::default();
        Self {
            root_dir: root_dir.into(),
            base_dir: None,
            patterns: defaults.patterns,
            max_chars: DEFAULT_MAX_CHARS,
            concurrency: defaults.concurrency,
            max_retries: defaults.max_retries,
            retry_backoff: Duration::from_millis(defaults.retry_backoff_ms),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(
        root_dir: PathBuf,
        base_dir: Option<PathBuf>,
        config: &IngestConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            root_dir,
            base_dir,
            patterns: config.patterns.clone(),
            max_chars: config.max_chars,
            concurrency: config.concurrency,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            timeout,
        }
    }

    pub fn effective_base_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(base) => base.clone(),
            None => self
                .root_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root_dir.clone()),
        }
    }
}

/// Walks a source tree and embeds every chunk of every matching file.
pub struct CorpusBuilder {
    options: BuildOptions,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl CorpusBuilder {
    pub fn new(options: BuildOptions, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { options, embedder }
    }

    /// Files under `root_dir` matching any pattern, in deterministic order.
    ///
    /// Entries are visited sorted by file name at every directory level.
    /// Patterns are matched against the `/`-separated path relative to
    /// `root_dir`.
    pub fn discover(&self) -> Result<Vec<PathBuf>, RagError> {
        discover_files(&self.options)
    }

    /// Build the corpus records for the whole tree.
    ///
    /// Output order is file discovery order, then chunk order within a file,
    /// even though embedding requests run concurrently. Any unreadable file
    /// or embedding failure that survives the retries aborts the build.
    pub async fn build(&self) -> Result<Vec<ChunkRecord>, RagError> {
        let options = self.options.clone();
        let (file_count, pending) = tokio::task::spawn_blocking(move || read_chunks(&options))
            .await
            .map_err(|e| RagError::io(&self.options.root_dir, std::io::Error::other(e)))??;

        let total = pending.len();
        tracing::info!("Embedding {} chunks", total);

        let records = stream::iter(pending)
            .map(|(file, text)| async move {
                let embedding = self.embed_with_retry(&text).await?;
                Ok::<_, RagError>(ChunkRecord {
                    file,
                    text,
                    embedding,
                })
            })
            .buffered(self.options.concurrency.max(1))
            .try_collect::<Vec<_>>()
            .await?;

        let corpus = Corpus::new(records)?;
        tracing::info!(
            "Embedded {} chunks from {} files (dimension {:?})",
            corpus.len(),
            file_count,
            corpus.dimension()
        );
        Ok(corpus.into_records())
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut attempt: u32 = 0;
        loop {
            let result = with_timeout(self.options.timeout, self.embedder.embed(text))
                .await
                .and_then(|embedding| {
                    if embedding.is_empty() {
                        Err(ProviderError::EmptyEmbedding)
                    } else {
                        Ok(embedding)
                    }
                });

            match result {
                Ok(embedding) => return Ok(embedding),
                Err(err) if err.is_transient() && attempt < self.options.max_retries => {
                    let delay = self.options.retry_backoff * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "Embedding via {} failed (attempt {}): {}; retrying in {:?}",
                        self.embedder.name(),
                        attempt,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn discover_files(options: &BuildOptions) -> Result<Vec<PathBuf>, RagError> {
    let matcher = build_glob_set(&options.patterns)?;
    let root = &options.root_dir;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_path(entry.path(), root);
        if matcher.is_match(&rel) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Discover, read and chunk every file; `(file count, (file, chunk) pairs)`.
///
/// Blocking file system work, run off the async executor.
fn read_chunks(options: &BuildOptions) -> Result<(usize, Vec<(String, String)>), RagError> {
    let files = discover_files(options)?;
    let base_dir = options.effective_base_dir();
    tracing::info!(
        "Discovered {} files under {}",
        files.len(),
        options.root_dir.display()
    );

    let mut pending = Vec::new();
    for path in &files {
        let content = fs::read_to_string(path).map_err(|e| RagError::io(path, e))?;
        let file = relative_path(path, &base_dir);
        let chunks = chunk_text(&content, options.max_chars);
        tracing::debug!("{}: {} chunks", file, chunks.len());
        pending.extend(chunks.into_iter().map(|text| (file.clone(), text)));
    }
    Ok((files.len(), pending))
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, RagError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// `path` relative to `base`, joined with `/` on every platform.
///
/// Paths outside `base` are returned whole, still `/`-joined.
pub fn relative_path(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
