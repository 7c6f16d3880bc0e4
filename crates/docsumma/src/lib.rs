//! docsumma: batch document Q&A over a local RAG pipeline
//!
//! Converts PDF, Word, PowerPoint and HTML files to markdown (retrying once
//! with OCR when the first pass finds no text), splits and embeds the
//! markdown into an in-memory index, and answers a fixed list of questions
//! per document with an Ollama-served LLM. Answers are appended to one text
//! file per document.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod session;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use processing::{BatchOrchestrator, BatchReport, ConversionAttempt, FileOutcome, FileReport};
pub use session::{IndexBuilder, QaSession};
pub use types::{
    document::{Chunk, DocumentFormat, MarkdownArtifact, SourceDocument},
    response::{AnswerRecord, QaAnswer, SourceChunk},
};
