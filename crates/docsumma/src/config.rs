//! Configuration for the document Q&A pipeline
//!
//! Loaded from a TOML file with `[FILES]` and `[MODEL]` sections (lower-case
//! section names are accepted too). Every key has a default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Filesystem layout
    #[serde(default, rename = "FILES", alias = "files")]
    pub files: FilesConfig,
    /// LLM / embedding configuration
    #[serde(default, rename = "MODEL", alias = "model")]
    pub model: ModelConfig,
    /// Text chunking configuration
    #[serde(default, rename = "CHUNKING", alias = "chunking")]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default, rename = "RETRIEVAL", alias = "retrieval")]
    pub retrieval: RetrievalConfig,
    /// OCR tool configuration
    #[serde(default, rename = "OCR", alias = "ocr")]
    pub ocr: OcrConfig,
    /// Questions asked of every document
    #[serde(default, rename = "QUESTIONS", alias = "questions")]
    pub questions: QuestionsConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("top_k must be greater than zero".to_string()));
        }
        if self.questions.list.iter().all(|q| q.trim().is_empty()) {
            return Err(Error::Config("at least one question is required".to_string()));
        }
        Ok(())
    }
}

/// Filesystem layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Directory holding the source documents
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Directory receiving `<stem>_answer.txt` files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory receiving `<stem>_converted.md` files
    #[serde(default = "default_md_dir")]
    pub md_dir: PathBuf,
}

fn default_input_dir() -> PathBuf { PathBuf::from("data") }
fn default_output_dir() -> PathBuf { PathBuf::from("answers") }
fn default_md_dir() -> PathBuf { PathBuf::from("markdown") }

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            md_dir: default_md_dir(),
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Generation model name
    #[serde(default = "default_model")]
    pub model: String,
    /// Embedding model name
    #[serde(default = "default_embed_model")]
    pub embed_model: String,
    /// Ollama base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Temperature for generation (0 = deterministic)
    #[serde(default)]
    pub temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String { "granite3.1-dense:8b".to_string() }
fn default_embed_model() -> String { "nomic-embed-text:latest".to_string() }
fn default_base_url() -> String { "http://localhost:11434".to_string() }
fn default_timeout_secs() -> u64 { 300 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            embed_model: default_embed_model(),
            base_url: default_base_url(),
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize { 500 }
fn default_chunk_overlap() -> usize { 50 }

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the LLM per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize { 10 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: default_top_k() }
    }
}

/// OCR configuration (pdftoppm + tesseract)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Rasterisation resolution for scanned pages
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Tesseract language code
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_dpi() -> u32 { 150 } // good balance of quality and speed
fn default_language() -> String { "eng".to_string() }

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            language: default_language(),
        }
    }
}

/// Fixed questions asked of every document, in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsConfig {
    #[serde(default = "default_questions")]
    pub list: Vec<String>,
}

fn default_questions() -> Vec<String> {
    vec![
        "What is the main topic of this document?".to_string(),
        "What are the key points discussed?".to_string(),
        "Can you summarize the document?".to_string(),
    ]
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self { list: default_questions() }
    }
}
