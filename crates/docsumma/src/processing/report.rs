//! Per-file outcomes and batch totals

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::DocumentFormat;

/// Terminal state of one file in a batch pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Every question was answered and persisted
    Answered { questions: usize },
    /// Extension not in the supported table
    Unsupported { extension: String },
    /// Both conversion attempts failed, or a non-retryable converter error
    ConversionFailed { message: String },
    /// Markdown could not be loaded
    LoadFailed { message: String },
    /// Markdown produced no chunks
    EmptyDocument,
    /// No usable embeddings
    NullIndex,
    /// Embedding or other provider error while indexing
    IndexFailed { message: String },
    /// A question failed; nothing was written for the file
    QuestionFailed { question: String, message: String },
    /// Answers were produced but could not be written
    PersistFailed { message: String },
}

impl FileOutcome {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_answered() && !self.is_skipped()
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Answered { questions } => write!(f, "answered {} questions", questions),
            Self::Unsupported { extension } => write!(f, "unsupported file format: {}", extension),
            Self::ConversionFailed { message } => write!(f, "conversion failed: {}", message),
            Self::LoadFailed { message } => write!(f, "load failed: {}", message),
            Self::EmptyDocument => f.write_str("no text to index"),
            Self::NullIndex => f.write_str("no usable embeddings"),
            Self::IndexFailed { message } => write!(f, "indexing failed: {}", message),
            Self::QuestionFailed { question, message } => {
                write!(f, "question {:?} failed: {}", question, message)
            }
            Self::PersistFailed { message } => write!(f, "writing answers failed: {}", message),
        }
    }
}

/// What happened to one file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub filename: String,
    pub format: DocumentFormat,
    pub outcome: FileOutcome,
    /// Conversion attempts made (0 for unsupported files)
    pub conversion_attempts: u32,
    pub ocr_used: bool,
    pub markdown_path: Option<PathBuf>,
    pub answer_path: Option<PathBuf>,
    pub elapsed: Duration,
}

impl FileReport {
    pub fn new(filename: impl Into<String>, format: DocumentFormat, outcome: FileOutcome) -> Self {
        Self {
            filename: filename.into(),
            format,
            outcome,
            conversion_attempts: 0,
            ocr_used: false,
            markdown_path: None,
            answer_path: None,
            elapsed: Duration::ZERO,
        }
    }
}

/// Result of one pass over the input directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn answered(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_answered()).count()
    }

    pub fn skipped(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_failure()).count()
    }

    pub fn ocr_retries(&self) -> usize {
        self.files.iter().filter(|f| f.conversion_attempts > 1).count()
    }

    pub fn get(&self, filename: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| f.filename == filename)
    }
}
