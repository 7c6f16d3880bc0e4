//! Core data types

pub mod document;
pub mod response;

pub use document::{Chunk, DocumentFormat, MarkdownArtifact, SourceDocument};
pub use response::{AnswerRecord, QaAnswer, SourceChunk};
