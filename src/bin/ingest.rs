use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use codechat::core::config::{AppPaths, ConfigService};
use codechat::core::logging;
use codechat::llm::Providers;
use codechat::rag::{persist, BuildOptions, CorpusBuilder, WriteMode};
use codechat::state::corpus_path;

#[derive(Parser, Debug)]
#[command(
    name = "codechat-ingest",
    about = "Chunk and embed a source tree into the corpus file served by codechat"
)]
struct IngestCli {
    /// Root of the source tree to index (default: ingest.source_dir or ../frontend/src)
    source_dir: Option<PathBuf>,

    /// Directory that recorded file paths are relative to (default: parent of the source tree)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Corpus file to write (default: corpus.path or data/embeddings.json)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Append to the existing corpus instead of replacing it
    #[arg(long, default_value_t = false)]
    append: bool,

    /// Maximum characters per chunk
    #[arg(long)]
    max_chars: Option<usize>,

    /// Maximum embedding requests in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Alternate config.yml
    #[arg(long, env = "CODECHAT_CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = IngestCli::parse();
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "ingest.log");

    let mut service = ConfigService::new(paths.clone());
    if let Some(path) = cli.config.clone() {
        service = service.with_config_path(path);
    }
    let mut config = service.load().context("failed to load configuration")?;

    if let Some(max_chars) = cli.max_chars {
        anyhow::ensure!(max_chars > 0, "--max-chars must be at least 1");
        config.ingest.max_chars = max_chars;
    }
    if let Some(concurrency) = cli.concurrency {
        anyhow::ensure!(concurrency > 0, "--concurrency must be at least 1");
        config.ingest.concurrency = concurrency;
    }

    let source_dir = cli
        .source_dir
        .or_else(|| config.ingest.source_dir.as_deref().map(|p| paths.resolve(p)))
        .unwrap_or_else(|| paths.default_source_dir());
    let base_dir = cli
        .base_dir
        .or_else(|| config.ingest.base_dir.as_deref().map(|p| paths.resolve(p)));
    let output = cli
        .output
        .unwrap_or_else(|| corpus_path(&paths, &config));
    let mode = if cli.append {
        WriteMode::Append
    } else {
        WriteMode::Overwrite
    };

    anyhow::ensure!(
        source_dir.is_dir(),
        "source directory {} does not exist",
        source_dir.display()
    );

    let providers = Providers::from_config(&config.providers)
        .context("failed to configure the embedding provider")?;
    tracing::info!("Embedding with {}", providers.embedder.name());

    let options = BuildOptions::from_config(
        source_dir,
        base_dir,
        &config.ingest,
        config.providers.timeout(),
    );
    let builder = CorpusBuilder::new(options, providers.embedder);
    let records = builder.build().await.context("corpus build failed")?;
    let added = records.len();

    let total = persist(&output, records, mode)
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!("Wrote {} chunks to {}", total, output.display());
    println!("Saved {} chunks ({} new) to {}", total, added, output.display());

    Ok(())
}
