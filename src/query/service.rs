use std::sync::Arc;
use std::time::Duration;

use crate::core::config::AppConfig;
use crate::llm::{with_timeout, EmbeddingProvider, GenerationProvider, Providers};
use crate::rag::{ContextBuilder, CorpusHandle, RagError, RankedResult};

/// Answer returned when the generation provider produced no text.
pub const FALLBACK_ANSWER: &str = "No answer.";

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub top_k: usize,
    pub subject: String,
    pub max_question_chars: usize,
    /// Upper bound for each individual provider call.
    pub timeout: Duration,
}

impl QueryOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.query.top_k,
            subject: config.query.subject.clone(),
            max_question_chars: config.query.max_question_chars,
            timeout: config.providers.timeout(),
        }
    }
}

/// Question answering over the shared corpus.
///
/// Holds no per-request state; one instance serves all requests
/// concurrently.
#[derive(Clone)]
pub struct QueryService {
    corpus: CorpusHandle,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    context: ContextBuilder,
    options: QueryOptions,
}

impl QueryService {
    pub fn new(corpus: CorpusHandle, providers: Providers, options: QueryOptions) -> Self {
        Self {
            corpus,
            embedder: providers.embedder,
            generator: providers.generator,
            context: ContextBuilder::new(options.subject.clone()),
            options,
        }
    }

    pub fn corpus(&self) -> &CorpusHandle {
        &self.corpus
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Full retrieval-augmented answer for `question`.
    ///
    /// Blank questions are rejected before any provider is called. An empty
    /// corpus is not an error: the prompt is sent without context.
    pub async fn ask(&self, question: &str) -> Result<String, RagError> {
        let question = self.validate(question)?;
        let ranked = self.retrieve(question).await?;

        if ranked.is_empty() {
            tracing::warn!("No corpus context available; generating without snippets");
        } else {
            tracing::debug!(
                "Retrieved {} chunks from {:?}",
                ranked.len(),
                self.context.sources(&ranked)
            );
        }

        let prompt = self.context.build_prompt(question, &ranked);
        let answer = with_timeout(self.options.timeout, self.generator.generate(&prompt)).await?;

        Ok(match answer {
            Some(text) if !text.trim().is_empty() => text,
            _ => FALLBACK_ANSWER.to_string(),
        })
    }

    fn validate<'q>(&self, question: &'q str) -> Result<&'q str, RagError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::InvalidInput("Question is required.".to_string()));
        }
        if question.chars().count() > self.options.max_question_chars {
            return Err(RagError::InvalidInput(format!(
                "Question exceeds {} characters.",
                self.options.max_question_chars
            )));
        }
        Ok(question)
    }

    async fn retrieve(&self, question: &str) -> Result<Vec<RankedResult>, RagError> {
        let query = with_timeout(self.options.timeout, self.embedder.embed(question)).await?;
        let corpus = self.corpus.snapshot().await;
        corpus.rank(&query, self.options.top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm::ProviderError;
    use crate::rag::{ChunkRecord, Corpus};

    struct FixedEmbedder {
        vector: Vec<f32>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector.clone())
        }
    }

    enum Reply {
        Text(&'static str),
        Nothing,
        Fail,
        Hang,
    }

    struct ScriptedGenerator {
        reply: Reply,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GenerationProvider for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.reply {
                Reply::Text(text) => Ok(Some(text.to_string())),
                Reply::Nothing => Ok(None),
                Reply::Fail => Err(ProviderError::Status {
                    status: 500,
                    body: "upstream exploded".to_string(),
                }),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(None)
                }
            }
        }
    }

    fn record(file: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            file: file.to_string(),
            text: format!("contents of {}", file),
            embedding,
        }
    }

    fn scenario_corpus() -> Corpus {
        Corpus::new(vec![
            record("a.ts", vec![1.0, 0.0]),
            record("b.ts", vec![0.0, 1.0]),
            record("c.ts", vec![1.0, 1.0]),
            record("d.ts", vec![-1.0, 0.0]),
            record("e.ts", vec![0.5, 0.5]),
        ])
        .unwrap()
    }

    fn service(
        corpus: Corpus,
        reply: Reply,
    ) -> (QueryService, Arc<FixedEmbedder>, Arc<ScriptedGenerator>) {
        let embedder = Arc::new(FixedEmbedder {
            vector: vec![1.0, 0.0],
            calls: AtomicUsize::new(0),
        });
        let generator = Arc::new(ScriptedGenerator {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        let providers = Providers {
            embedder: embedder.clone(),
            generator: generator.clone(),
        };
        let options = QueryOptions {
            top_k: 3,
            subject: "a React codebase".to_string(),
            max_question_chars: 100,
            timeout: Duration::from_millis(200),
        };
        let handle = CorpusHandle::new(corpus, PathBuf::from("embeddings.json"));
        (QueryService::new(handle, providers, options), embedder, generator)
    }

    #[tokio::test]
    async fn answers_with_top_three_chunks_in_prompt() {
        let (service, _, generator) = service(scenario_corpus(), Reply::Text("Look at a.ts"));

        let answer = service.ask("  where is it?  ").await.unwrap();
        assert_eq!(answer, "Look at a.ts");

        let prompts = generator.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("Chunk 1 (a.ts):\ncontents of a.ts"));
        assert!(prompt.contains("Chunk 2 (c.ts):"));
        assert!(prompt.contains("Chunk 3 (e.ts):"));
        assert!(!prompt.contains("b.ts"));
        assert!(!prompt.contains("d.ts"));
        assert!(prompt.contains("Question: where is it?\n"));
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_any_provider_call() {
        let (service, embedder, generator) = service(scenario_corpus(), Reply::Text("x"));

        let err = service.ask("   \n\t").await.unwrap_err();

        assert!(matches!(err, RagError::InvalidInput(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn overlong_question_is_invalid_input() {
        let (service, embedder, _) = service(scenario_corpus(), Reply::Text("x"));

        let err = service.ask(&"q".repeat(101)).await.unwrap_err();

        assert!(matches!(err, RagError::InvalidInput(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_generation_text_falls_back() {
        let (service, _, _) = service(scenario_corpus(), Reply::Nothing);
        assert_eq!(service.ask("anything?").await.unwrap(), FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn generation_failure_is_a_provider_error() {
        let (service, _, _) = service(scenario_corpus(), Reply::Fail);
        let err = service.ask("anything?").await.unwrap_err();
        assert!(matches!(err, RagError::Provider(ProviderError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn hanging_generation_times_out() {
        let (service, _, _) = service(scenario_corpus(), Reply::Hang);
        let err = service.ask("anything?").await.unwrap_err();
        assert!(matches!(err, RagError::Provider(ProviderError::Timeout(_))));
    }

    #[tokio::test]
    async fn empty_corpus_still_generates() {
        let (service, _, generator) = service(Corpus::empty(), Reply::Text("no context"));

        assert_eq!(service.ask("hello?").await.unwrap(), "no context");
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("Context (top snippets):\n\n\nQuestion: hello?"));
    }

    #[tokio::test]
    async fn query_dimension_must_match_corpus() {
        let corpus = Corpus::new(vec![record("a.ts", vec![1.0, 0.0, 0.0])]).unwrap();
        let (service, _, generator) = service(corpus, Reply::Text("x"));

        let err = service.ask("hello?").await.unwrap_err();

        assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

}
