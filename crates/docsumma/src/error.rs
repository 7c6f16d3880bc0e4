//! Error types for the document Q&A pipeline

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
///
/// Every variant except `Config` and input-directory `Io` failures is scoped to
/// a single document: the batch orchestrator logs it and moves on.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File extension not handled by the converter
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Converter produced no usable content (triggers the OCR retry)
    #[error("Failed to convert '{filename}': {message}")]
    Conversion { filename: String, message: String },

    /// Markdown loader rejected its input
    #[error("Failed to load '{}': {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// Splitting produced no chunks
    #[error("Document produced no chunks: {}", .0.display())]
    EmptyDocument(PathBuf),

    /// Index construction yielded no usable vectors
    #[error("No usable vectors for index: {}", .0.display())]
    NullIndex(PathBuf),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Ollama/LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML config parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a conversion error
    pub fn conversion(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a load error
    pub fn load(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this failure should send the document back through the
    /// converter with OCR enabled
    pub fn is_retryable_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// Short machine-friendly label used in batch reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Conversion { .. } => "conversion",
            Self::Load { .. } => "load",
            Self::EmptyDocument(_) => "empty_document",
            Self::NullIndex(_) => "null_index",
            Self::Embedding(_) => "embedding",
            Self::Llm(_) => "llm",
            Self::Io(_) => "io",
            Self::Toml(_) => "toml",
            Self::Json(_) => "json",
            Self::Http(_) => "http",
            Self::Internal(_) => "internal",
        }
    }
}
