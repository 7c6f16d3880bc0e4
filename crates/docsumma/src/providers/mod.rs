//! Provider abstractions for embeddings and LLM generation
//!
//! Trait-based so the pipeline can run against Ollama or an in-process fake.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaEmbedder, OllamaLlm, OllamaProvider};
