//! Prompt assembly and answer synthesis.
//!
//! Builds the grounded chat prompt from the retrieved chunks, invokes the
//! generative model at zero temperature, and pairs the model's text with
//! truncated source excerpts for citation display. A generation failure
//! propagates; there is no fallback answer.

use anyhow::Result;

use crate::generation::Generator;
use crate::models::{Answer, ScoredChunk, SourceExcerpt};

/// System instruction restricting the model to the retrieved context.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions about climate science based on IPCC reports. Use only the provided context to answer questions. If the answer is not in the context, say 'I don't know based on the provided documents.'";

/// Characters of each source chunk shown in citation previews.
pub const SOURCE_PREVIEW_CHARS: usize = 200;

/// Zero temperature keeps decoding deterministic for a fixed index and model.
pub const ANSWER_TEMPERATURE: f32 = 0.0;

/// Build the user message: retrieved chunk texts joined by blank lines,
/// then the question.
pub fn build_prompt(question: &str, retrieved: &[ScoredChunk]) -> String {
    let context = retrieved
        .iter()
        .map(|r| r.chunk.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Context:\n{}\n\nQuestion: {}", context, question)
}

/// Head of a chunk for citation display. The ellipsis marker is appended
/// only when content was actually cut.
pub fn source_preview(content: &str) -> String {
    let mut chars = content.chars();
    let preview: String = chars.by_ref().take(SOURCE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Generate an answer grounded in the retrieved chunks and return it with
/// one source excerpt per chunk, in retrieval order.
pub async fn synthesize(
    generator: &dyn Generator,
    question: &str,
    retrieved: &[ScoredChunk],
) -> Result<Answer> {
    let prompt = build_prompt(question, retrieved);
    let answer = generator
        .generate(SYSTEM_PROMPT, &prompt, ANSWER_TEMPERATURE)
        .await?;

    let sources = retrieved
        .iter()
        .map(|r| SourceExcerpt {
            content: source_preview(&r.chunk.page_content),
            metadata: r.chunk.metadata.clone(),
        })
        .collect();

    Ok(Answer { answer, sources })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Stub generator that records the prompt it was given and returns a
    /// canned reply.
    struct RecordingGenerator {
        reply: String,
        seen: Mutex<Option<(String, String, f32)>>,
    }

    impl RecordingGenerator {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
            *self.seen.lock().unwrap() = Some((system.to_string(), user.to_string(), temperature));
            Ok(self.reply.clone())
        }
    }

    fn retrieved(contents: &[&str]) -> Vec<ScoredChunk> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| ScoredChunk {
                chunk: Chunk::new(*c, "data/ar6.pdf", i + 1),
                score: 1.0 - i as f32 * 0.1,
            })
            .collect()
    }

    #[test]
    fn prompt_joins_context_with_blank_lines() {
        let prompt = build_prompt("Why is the sea rising?", &retrieved(&["First.", "Second."]));
        assert_eq!(
            prompt,
            "Context:\nFirst.\n\nSecond.\n\nQuestion: Why is the sea rising?"
        );
    }

    #[test]
    fn preview_truncates_only_long_content() {
        let long = "x".repeat(300);
        let preview = source_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), SOURCE_PREVIEW_CHARS + 3);

        let exact = "y".repeat(SOURCE_PREVIEW_CHARS);
        assert_eq!(source_preview(&exact), exact);

        assert_eq!(source_preview("short"), "short");
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let long = "é".repeat(250);
        let preview = source_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), SOURCE_PREVIEW_CHARS + 3);
    }

    #[tokio::test]
    async fn non_knowledge_reply_passes_through_unmodified() {
        let reply = "I don't know based on the provided documents.";
        let generator = RecordingGenerator::replying(reply);
        let answer = synthesize(&generator, "What is unrelated?", &retrieved(&["Off topic."]))
            .await
            .unwrap();
        assert_eq!(answer.answer, reply);
    }

    #[tokio::test]
    async fn synthesize_sends_grounded_prompt_at_zero_temperature() {
        let generator = RecordingGenerator::replying("Warming is unequivocal.");
        let chunks = retrieved(&["Evidence A.", "Evidence B."]);
        let answer = synthesize(&generator, "Is warming real?", &chunks)
            .await
            .unwrap();

        let seen = generator.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.0, SYSTEM_PROMPT);
        assert!(seen.1.contains("Evidence A."));
        assert!(seen.1.contains("Evidence B."));
        assert!(seen.1.ends_with("Question: Is warming real?"));
        assert_eq!(seen.2, 0.0);

        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].content, "Evidence A.");
        assert_eq!(answer.sources[0].metadata.page, 1);
        assert_eq!(answer.sources[1].metadata.page, 2);
    }

    #[tokio::test]
    async fn long_sources_are_truncated_in_the_answer() {
        let generator = RecordingGenerator::replying("ok");
        let long = "z".repeat(400);
        let answer = synthesize(&generator, "q", &retrieved(&[long.as_str()]))
            .await
            .unwrap();
        assert!(answer.sources[0].content.ends_with("..."));
        assert_eq!(
            answer.sources[0].content.chars().count(),
            SOURCE_PREVIEW_CHARS + 3
        );
    }
}
