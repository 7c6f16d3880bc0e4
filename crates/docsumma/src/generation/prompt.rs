//! Prompt templates for conversational document QA

use crate::types::SourceChunk;

/// Prompt builder for QA sessions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build context from retrieved chunks, most similar first
    pub fn build_context(sources: &[SourceChunk]) -> String {
        let mut context = String::new();

        for (i, source) in sources.iter().enumerate() {
            context.push_str(&format!(
                "[{}] (chunk {}, chars {}-{})\n{}\n\n",
                i + 1,
                source.chunk.index,
                source.chunk.char_start,
                source.chunk.char_end,
                source.chunk.content
            ));
        }

        context
    }

    /// Build a QA prompt that carries the earlier turns of the session
    pub fn build_conversational_prompt(question: &str, context: &str, history: &str) -> String {
        let history = if history.trim().is_empty() {
            String::new()
        } else {
            format!("\nCONVERSATION SO FAR:\n{}\n", history.trim_end())
        };

        format!(
            r#"You are an assistant answering questions about a single document.
Use the excerpts below to answer. If the excerpts do not contain the answer, say that the document does not say.
{history}
DOCUMENT EXCERPTS:
{context}
QUESTION: {question}

ANSWER:"#,
            history = history,
            context = context,
            question = question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    #[test]
    fn test_context_numbers_sources() {
        let sources = vec![
            SourceChunk {
                chunk: Chunk::new(3, "Revenue grew.".to_string(), 120),
                similarity: 0.9,
            },
            SourceChunk {
                chunk: Chunk::new(0, "Intro.".to_string(), 0),
                similarity: 0.4,
            },
        ];
        let context = PromptBuilder::build_context(&sources);
        assert!(context.starts_with("[1] (chunk 3, chars 120-133)\nRevenue grew."));
        assert!(context.contains("[2] (chunk 0, chars 0-6)\nIntro."));
    }

    #[test]
    fn test_history_section_only_when_present() {
        let without = PromptBuilder::build_conversational_prompt("Q?", "ctx", "");
        assert!(!without.contains("CONVERSATION SO FAR"));

        let with = PromptBuilder::build_conversational_prompt(
            "Q2?",
            "ctx",
            "Human: Q1?\nAssistant: A1.\n",
        );
        assert!(with.contains("CONVERSATION SO FAR:\nHuman: Q1?\nAssistant: A1.\n"));
        assert!(with.ends_with("QUESTION: Q2?\n\nANSWER:"));
    }
}
