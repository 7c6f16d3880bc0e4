//! Document, markdown artifact and chunk types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Source document formats understood by the converter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx, .doc)
    Docx,
    /// Microsoft PowerPoint presentation (.pptx)
    Pptx,
    /// HTML document (.html, .htm)
    Html,
    /// Anything else
    Unsupported,
}

impl DocumentFormat {
    /// Detect the format from a lower-cased extension (without the dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" | "doc" => Self::Docx,
            "pptx" => Self::Pptx,
            "html" | "htm" => Self::Html,
            _ => Self::Unsupported,
        }
    }

    /// Classify a path by its extension. No filesystem access.
    pub fn classify(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unsupported)
    }

    /// Check if this is a supported format
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document",
            Self::Pptx => "PowerPoint",
            Self::Html => "HTML",
            Self::Unsupported => "Unsupported",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A file discovered in the input directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Path to the original file
    pub path: PathBuf,
    /// Format inferred from the extension
    pub format: DocumentFormat,
}

impl SourceDocument {
    /// Classify a path into a source document
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = DocumentFormat::classify(&path);
        Self { path, format }
    }

    /// File name for log lines
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// File stem used for derived artifact names
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string())
    }

    /// Extension as written (for unsupported-format notices)
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    }

    /// `<stem>_converted.md`
    pub fn markdown_filename(&self) -> String {
        format!("{}_converted.md", self.stem())
    }

    /// `<stem>_answer.txt`
    pub fn answer_filename(&self) -> String {
        format!("{}_answer.txt", self.stem())
    }
}

/// Markdown written by the converter for one source document
#[derive(Debug, Clone)]
pub struct MarkdownArtifact {
    /// Where the markdown was written
    pub path: PathBuf,
    /// SHA-256 of the markdown text
    pub content_hash: String,
    /// Number of pages the engine reported
    pub pages: usize,
    /// Whether OCR was enabled for the successful attempt
    pub ocr_used: bool,
}

/// A text segment of a markdown document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Position in the chunk set
    pub index: u32,
    /// Chunk text
    pub content: String,
    /// Character offset of the first character in the loaded text
    pub char_start: usize,
    /// Character offset one past the last character
    pub char_end: usize,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(index: u32, content: String, char_start: usize) -> Self {
        let char_end = char_start + content.chars().count();
        Self {
            id: Uuid::new_v4(),
            index,
            content,
            char_start,
            char_end,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_supported_extensions() {
        let cases = [
            ("report.pdf", DocumentFormat::Pdf),
            ("memo.docx", DocumentFormat::Docx),
            ("legacy.doc", DocumentFormat::Docx),
            ("deck.pptx", DocumentFormat::Pptx),
            ("page.html", DocumentFormat::Html),
            ("page.htm", DocumentFormat::Html),
            ("SHOUTING.PDF", DocumentFormat::Pdf),
            ("Mixed.DocX", DocumentFormat::Docx),
            ("data/nested/dir/file.HTM", DocumentFormat::Html),
        ];

        for (path, expected) in cases {
            assert_eq!(DocumentFormat::classify(path), expected, "{}", path);
        }
    }

    #[test]
    fn test_classify_unsupported() {
        for path in ["notes.xyz", "sheet.xlsx", "slides.ppt", "README", "archive.tar.gz", ".pdf", ""] {
            assert_eq!(DocumentFormat::classify(path), DocumentFormat::Unsupported, "{:?}", path);
        }
    }

    #[test]
    fn test_derived_names() {
        let doc = SourceDocument::new("data/Quarterly Report.pdf");
        assert_eq!(doc.format, DocumentFormat::Pdf);
        assert_eq!(doc.filename(), "Quarterly Report.pdf");
        assert_eq!(doc.markdown_filename(), "Quarterly Report_converted.md");
        assert_eq!(doc.answer_filename(), "Quarterly Report_answer.txt");
        assert_eq!(SourceDocument::new("x/notes.xyz").extension(), ".xyz");
    }

    #[test]
    fn test_chunk_offsets_count_chars() {
        let chunk = Chunk::new(0, "héllo".to_string(), 10);
        assert_eq!(chunk.char_len(), 5);
        assert_eq!(chunk.char_end, 15);
    }
}
