//! Conversational question answering over one document's index

use std::sync::Arc;

use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::VectorIndex;
use crate::types::QaAnswer;

use super::memory::ConversationMemory;

/// Index, providers and conversation memory for one document.
/// Dropped once its questions are answered.
pub struct QaSession {
    name: String,
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    memory: ConversationMemory,
    top_k: usize,
}

impl QaSession {
    pub fn new(
        name: impl Into<String>,
        index: VectorIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            embedder,
            llm,
            memory: ConversationMemory::new(),
            top_k: top_k.max(1),
        }
    }

    /// Answer `question` from the top-K chunks and the session history,
    /// then record the turn.
    pub async fn ask(&mut self, question: &str) -> Result<QaAnswer> {
        let query_embedding = self.embedder.embed(question).await?;
        let sources = self.index.search(&query_embedding, self.top_k)?;

        tracing::debug!(
            "[{}] Retrieved {} chunks (best similarity {:.3})",
            self.name,
            sources.len(),
            sources.first().map(|s| s.similarity).unwrap_or(0.0)
        );

        let context = PromptBuilder::build_context(&sources);
        let prompt =
            PromptBuilder::build_conversational_prompt(question, &context, &self.memory.render());

        let answer = self.llm.generate(&prompt).await?;
        let answer = answer.trim().to_string();

        self.memory.push(question, answer.clone());

        Ok(QaAnswer { answer, sources })
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
