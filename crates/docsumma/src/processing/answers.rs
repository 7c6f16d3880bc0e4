//! Append-only answer files

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{AnswerRecord, SourceDocument};

/// Writes `<stem>_answer.txt` files under an output directory
pub struct AnswerWriter {
    output_dir: PathBuf,
}

impl AnswerWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn answer_path(&self, source: &SourceDocument) -> PathBuf {
        self.output_dir.join(source.answer_filename())
    }

    /// Append all records in a single write. Existing content is kept.
    pub fn append(&self, source: &SourceDocument, records: &[AnswerRecord]) -> Result<PathBuf> {
        let path = self.answer_path(source);
        append_records(&path, records)?;
        Ok(path)
    }
}

fn append_records(path: &Path, records: &[AnswerRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let payload: String = records.iter().map(AnswerRecord::to_block).collect();

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(payload.as_bytes())?;
    file.flush()?;

    Ok(())
}
