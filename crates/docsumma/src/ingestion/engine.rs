//! Conversion engine contract
//!
//! The engine turns one source file into a paged, markdown-exportable
//! document. `NativeEngine` is the default implementation; tests plug in
//! their own.

use std::path::Path;

use crate::error::Result;
use crate::types::DocumentFormat;

/// Options passed to the engine for one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Run OCR on page images instead of reading embedded text
    pub ocr: bool,
    /// Render tables as markdown tables
    pub table_structure: bool,
    /// Formats the engine may accept
    pub allowed_formats: Vec<DocumentFormat>,
}

impl ConversionOptions {
    /// Options used by the converter: table structure always on, the four
    /// supported formats, OCR per flag
    pub fn new(ocr: bool) -> Self {
        Self {
            ocr,
            table_structure: true,
            allowed_formats: vec![
                DocumentFormat::Pdf,
                DocumentFormat::Docx,
                DocumentFormat::Html,
                DocumentFormat::Pptx,
            ],
        }
    }

    /// Check whether the format is allowed
    pub fn allows(&self, format: DocumentFormat) -> bool {
        self.allowed_formats.contains(&format)
    }
}

/// One page (or slide) of a converted document
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedPage {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Number of extracted content units (text lines, paragraphs, cells)
    pub content_units: usize,
    /// Markdown for the page
    pub markdown: String,
}

impl ConvertedPage {
    /// Build a page, counting non-blank markdown lines as content units
    pub fn from_markdown(page_number: u32, markdown: String) -> Self {
        let content_units = markdown.lines().filter(|l| !l.trim().is_empty()).count();
        Self {
            page_number,
            content_units,
            markdown,
        }
    }
}

/// Structured result of a conversion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertedDocument {
    pub pages: Vec<ConvertedPage>,
}

impl ConvertedDocument {
    pub fn new(pages: Vec<ConvertedPage>) -> Self {
        Self { pages }
    }

    /// Content units of the first page (0 when there are no pages)
    pub fn first_page_content_units(&self) -> usize {
        self.pages.first().map(|p| p.content_units).unwrap_or(0)
    }

    /// Export the whole document as markdown, pages separated by a blank line
    pub fn export_markdown(&self) -> String {
        let mut out = self
            .pages
            .iter()
            .map(|p| p.markdown.trim())
            .filter(|md| !md.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// Document-to-markdown engine
pub trait ConversionEngine: Send + Sync {
    /// Convert the file at `path` (already classified as `format`)
    fn convert(
        &self,
        path: &Path,
        format: DocumentFormat,
        options: &ConversionOptions,
    ) -> Result<ConvertedDocument>;

    /// Engine name for logging
    fn name(&self) -> &str;
}
