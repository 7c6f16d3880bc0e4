//! Answer types

use serde::{Deserialize, Serialize};

use super::document::Chunk;

/// A retrieved chunk with its similarity to the question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity (higher is more similar)
    pub similarity: f32,
}

/// Result of asking a question in a QA session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaAnswer {
    /// Generated answer text
    pub answer: String,
    /// Chunks the answer was conditioned on, most similar first
    pub sources: Vec<SourceChunk>,
}

/// Question/answer pair persisted to a document's answer file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
}

impl AnswerRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// `<question>\n<answer>\n\n`
    pub fn to_block(&self) -> String {
        format!("{}\n{}\n\n", self.question, self.answer)
    }
}
