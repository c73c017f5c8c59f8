//! Retrieval engine.
//!
//! - `chunker`: fixed-size character windows
//! - `builder`: walks a source tree and embeds every chunk (offline)
//! - `store`: chunk records, the JSON corpus file and the shared handle
//! - `ranker`: brute-force cosine top-k
//! - `context_builder`: turns ranked chunks into a generation prompt

pub mod builder;
pub mod chunker;
pub mod context_builder;
pub mod error;
pub mod ranker;
pub mod store;

pub use builder::{BuildOptions, CorpusBuilder};
pub use chunker::chunk_text;
pub use context_builder::ContextBuilder;
pub use error::RagError;
pub use ranker::{cosine_similarity, rank, RankedResult};
pub use store::{persist, ChunkRecord, Corpus, CorpusHandle, WriteMode};
