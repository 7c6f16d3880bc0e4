//! Conversion adapter: isolated copy, engine call, validation, markdown write

use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{MarkdownArtifact, SourceDocument};

use super::engine::{ConversionEngine, ConversionOptions};

/// Drives a `ConversionEngine` for one document at a time
pub struct DocumentConverter {
    engine: Arc<dyn ConversionEngine>,
}

impl DocumentConverter {
    pub fn new(engine: Arc<dyn ConversionEngine>) -> Self {
        Self { engine }
    }

    /// Convert `source` into `<output_dir>/<stem>_converted.md`.
    ///
    /// The source is copied into a fresh temporary directory first; the
    /// directory is removed when this returns, on success or error. A result
    /// whose first page has no content units is a `Conversion` error so the
    /// caller can retry with OCR.
    pub fn convert(
        &self,
        source: &SourceDocument,
        output_dir: &Path,
        ocr_enabled: bool,
    ) -> Result<MarkdownArtifact> {
        let filename = source.filename();
        let options = ConversionOptions::new(ocr_enabled);

        if !options.allows(source.format) {
            return Err(Error::UnsupportedFormat(source.extension()));
        }

        tracing::info!(
            "[{}] Converting with {} engine (ocr={})",
            filename,
            self.engine.name(),
            ocr_enabled
        );

        let temp_dir = tempfile::Builder::new()
            .prefix("docsumma-convert-")
            .tempdir()?;
        let temp_input = temp_dir.path().join(&filename);
        std::fs::copy(&source.path, &temp_input)?;

        let converted = self.engine.convert(&temp_input, source.format, &options)?;

        if converted.first_page_content_units() == 0 {
            return Err(Error::conversion(
                &filename,
                format!(
                    "no extractable content on the first page ({} pages)",
                    converted.pages.len()
                ),
            ));
        }

        let markdown = converted.export_markdown();

        std::fs::create_dir_all(output_dir)?;
        let md_path = output_dir.join(source.markdown_filename());
        std::fs::write(&md_path, &markdown)?;

        tracing::info!(
            "[{}] Wrote {} ({} chars, {} pages)",
            filename,
            md_path.display(),
            markdown.chars().count(),
            converted.pages.len()
        );

        Ok(MarkdownArtifact {
            path: md_path,
            content_hash: hash_content(&markdown),
            pages: converted.pages.len(),
            ocr_used: ocr_enabled,
        })
    }
}

/// Hash content for idempotence checks
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
