//! Prompt assembly from ranked chunks.
//!
//! Each ranked chunk becomes a labeled block naming its file, in rank order,
//! followed by the user's question.

use super::ranker::RankedResult;

/// Builds the generation prompt for a question and its retrieved chunks.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    subject: String,
}

impl ContextBuilder {
    /// `subject` completes "answering questions about ..." in the preamble.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    /// Labeled context blocks, separated by blank lines.
    pub fn build_context(&self, results: &[RankedResult]) -> String {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| format!("Chunk {} ({}):\n{}", i + 1, r.record.file, r.record.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn build_prompt(&self, question: &str, results: &[RankedResult]) -> String {
        format!(
            "You are a helpful assistant answering questions about {}.\n\n\
             Context (top snippets):\n{}\n\n\
             Question: {}\n\n\
             Answer clearly and cite file names where helpful.",
            self.subject,
            self.build_context(results),
            question
        )
    }

    /// Distinct files referenced by `results`, in first-seen order.
    pub fn sources<'a>(&self, results: &'a [RankedResult]) -> Vec<&'a str> {
        let mut sources: Vec<&str> = Vec::new();
        for result in results {
            let file = result.record.file.as_str();
            if !sources.contains(&file) {
                sources.push(file);
            }
        }
        sources
    }
}
