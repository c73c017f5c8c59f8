#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use codechat::llm::{EmbeddingProvider, GenerationProvider, ProviderError};

/// Embeds text as `[chars, vowels, 1]`, so equal texts get equal vectors.
#[derive(Default)]
pub struct CountingEmbedder {
    pub calls: AtomicUsize,
    /// Fail permanently on any text containing this marker.
    pub poison: Option<&'static str>,
    /// Number of leading calls answered with a 503.
    pub flaky_calls: usize,
}

impl CountingEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn vector_for(text: &str) -> Vec<f32> {
    let chars = text.chars().count() as f32;
    let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count() as f32;
    vec![chars, vowels, 1.0]
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn name(&self) -> &str {
        "counting"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.flaky_calls {
            return Err(ProviderError::Status {
                status: 503,
                body: "overloaded".to_string(),
            });
        }
        if let Some(marker) = self.poison {
            if text.contains(marker) {
                return Err(ProviderError::Status {
                    status: 400,
                    body: "rejected".to_string(),
                });
            }
        }
        Ok(vector_for(text))
    }
}

/// Always embeds to the same vector.
pub struct FixedEmbedder {
    pub vector: Vec<f32>,
    pub calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
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

/// Replies with `answer`, or fails with a 500 when `answer` is `None`.
pub struct CannedGenerator {
    pub answer: Option<&'static str>,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn answering(answer: &'static str) -> Self {
        Self {
            answer: Some(answer),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for CannedGenerator {
    fn name(&self) -> &str {
        "canned"
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.answer {
            Some(answer) => Ok(Some(answer.to_string())),
            None => Err(ProviderError::Status {
                status: 500,
                body: "model crashed".to_string(),
            }),
        }
    }
}

/// Sleeps longer for text earlier in `alphabet`, so requests issued first
/// finish last.
pub struct SlowStartEmbedder {
    pub alphabet: &'static str,
    pub step: Duration,
}

#[async_trait]
impl EmbeddingProvider for SlowStartEmbedder {
    fn name(&self) -> &str {
        "slow-start"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let position = text
            .chars()
            .next()
            .and_then(|c| self.alphabet.find(c))
            .unwrap_or(0);
        let remaining = self.alphabet.len().saturating_sub(position) as u32;
        tokio::time::sleep(self.step * remaining).await;
        Ok(vector_for(text))
    }
}
