//! OCR for scanned PDFs via local tools (pdftoppm + tesseract)

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::OcrConfig;
use crate::error::{Error, Result};

/// Page-image OCR backed by poppler-utils and tesseract
#[derive(Debug, Clone)]
pub struct PdfOcr {
    dpi: u32,
    language: String,
}

impl PdfOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            dpi: config.dpi,
            language: config.language.clone(),
        }
    }

    /// Check if tesseract is available
    pub fn has_tesseract() -> bool {
        Command::new("tesseract")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Check if pdftoppm is available
    pub fn has_pdftoppm() -> bool {
        Command::new("pdftoppm")
            .arg("-v")
            .output()
            .map(|_| true) // prints its version to stderr
            .unwrap_or(false)
    }

    /// Rasterise every page and OCR it. Returns one string per page, in order.
    pub fn ocr_pages(&self, pdf_path: &Path) -> Result<Vec<String>> {
        let filename = display_name(pdf_path);

        if !Self::has_pdftoppm() || !Self::has_tesseract() {
            return Err(Error::conversion(
                filename,
                "OCR requires pdftoppm and tesseract. Install with: apt install poppler-utils tesseract-ocr",
            ));
        }

        let image_dir = tempfile::Builder::new()
            .prefix("docsumma-ocr-")
            .tempdir()?;
        let prefix = image_dir.path().join("page");

        let pdftoppm_output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| Error::conversion(&filename, format!("pdftoppm failed: {}", e)))?;

        if !pdftoppm_output.status.success() {
            let stderr = String::from_utf8_lossy(&pdftoppm_output.stderr);
            return Err(Error::conversion(&filename, format!("pdftoppm error: {}", stderr)));
        }

        let mut page_images: Vec<PathBuf> = std::fs::read_dir(image_dir.path())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        page_images.sort_by_key(|p| page_index(p));

        if page_images.is_empty() {
            return Err(Error::conversion(&filename, "pdftoppm produced no images"));
        }

        let mut pages = Vec::with_capacity(page_images.len());
        for (i, image_path) in page_images.iter().enumerate() {
            let ocr_output = Command::new("tesseract")
                .arg(image_path)
                .arg("stdout")
                .arg("-l")
                .arg(&self.language)
                .output()
                .map_err(|e| {
                    Error::conversion(&filename, format!("tesseract failed on page {}: {}", i + 1, e))
                })?;

            if ocr_output.status.success() {
                pages.push(String::from_utf8_lossy(&ocr_output.stdout).to_string());
            } else {
                tracing::warn!(
                    "[{}] tesseract failed on page {}: {}",
                    filename,
                    i + 1,
                    String::from_utf8_lossy(&ocr_output.stderr).trim()
                );
                pages.push(String::new());
            }
        }

        tracing::info!(
            "[{}] OCR extracted {} characters from {} pages",
            filename,
            pages.iter().map(|p| p.len()).sum::<usize>(),
            pages.len()
        );

        Ok(pages)
    }
}

/// pdftoppm names pages `page-1.png`, `page-01.png`, ... depending on page
/// count; sort numerically rather than lexically.
fn page_index(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.rsplit('-').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_index_sorts_numerically() {
        let mut pages = vec![
            PathBuf::from("/tmp/x/page-10.png"),
            PathBuf::from("/tmp/x/page-2.png"),
            PathBuf::from("/tmp/x/page-01.png"),
        ];
        pages.sort_by_key(|p| page_index(p));
        assert_eq!(pages[0], PathBuf::from("/tmp/x/page-01.png"));
        assert_eq!(pages[2], PathBuf::from("/tmp/x/page-10.png"));
    }
}
