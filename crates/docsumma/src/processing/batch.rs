//! Batch orchestrator: one sequential pass over the input directory

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use walkdir::WalkDir;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::ingestion::{ConversionEngine, DocumentConverter};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::session::IndexBuilder;
use crate::types::{AnswerRecord, MarkdownArtifact, SourceDocument};

use super::answers::AnswerWriter;
use super::report::{BatchReport, FileOutcome, FileReport};
use super::retry::ConversionAttempt;

/// Converts, indexes and questions every document in `files.input_dir`
pub struct BatchOrchestrator {
    config: AppConfig,
    converter: DocumentConverter,
    index_builder: IndexBuilder,
    writer: AnswerWriter,
}

impl BatchOrchestrator {
    pub fn new(
        config: AppConfig,
        engine: Arc<dyn ConversionEngine>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let index_builder = IndexBuilder::new(&config, embedder, llm);
        let writer = AnswerWriter::new(config.files.output_dir.clone());
        Self {
            converter: DocumentConverter::new(engine),
            index_builder,
            writer,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Regular files directly inside the input directory, sorted by name
    pub fn discover(&self) -> Result<Vec<SourceDocument>> {
        let input_dir = &self.config.files.input_dir;
        if !input_dir.is_dir() {
            return Err(Error::Config(format!(
                "input directory {} does not exist or is not a directory",
                input_dir.display()
            )));
        }

        let mut documents = Vec::new();
        for entry in WalkDir::new(input_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(Error::Config(format!(
                        "cannot read input directory {}: {}",
                        input_dir.display(),
                        e
                    )));
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_file() {
                documents.push(SourceDocument::new(entry.into_path()));
            }
        }

        Ok(documents)
    }

    /// Run one pass over the input directory
    pub async fn run(&self) -> Result<BatchReport> {
        let documents = self.discover()?;
        Ok(self.run_documents(documents, |_| {}).await)
    }

    /// Process `documents` in order, calling `on_file` after each one.
    /// Per-file failures are recorded in the report, never returned.
    pub async fn run_documents<F>(&self, documents: Vec<SourceDocument>, mut on_file: F) -> BatchReport
    where
        F: FnMut(&FileReport),
    {
        let started = Instant::now();
        let mut report = BatchReport::default();

        tracing::info!(
            "Processing {} files from {}",
            documents.len(),
            self.config.files.input_dir.display()
        );

        for source in &documents {
            let file_report = self.process_file(source).await;
            on_file(&file_report);
            report.files.push(file_report);
        }

        report.elapsed = started.elapsed();

        tracing::info!(
            "Batch complete: {} answered, {} skipped, {} failed in {:.1}s",
            report.answered(),
            report.skipped(),
            report.failed(),
            report.elapsed.as_secs_f64()
        );

        report
    }

    /// Classify, convert (with one OCR retry), index, ask and persist
    pub async fn process_file(&self, source: &SourceDocument) -> FileReport {
        let started = Instant::now();
        let filename = source.filename();

        let mut file_report = if !source.format.is_supported() {
            tracing::warn!("[{}] Unsupported file format: {}", filename, source.extension());
            FileReport::new(
                &filename,
                source.format,
                FileOutcome::Unsupported {
                    extension: source.extension(),
                },
            )
        } else {
            tracing::info!("[{}] Processing {} document", filename, source.format);
            self.process_supported(source).await
        };

        file_report.elapsed = started.elapsed();

        if file_report.outcome.is_failure() {
            tracing::error!("[{}] {}", filename, file_report.outcome);
        } else {
            tracing::info!("[{}] {}", filename, file_report.outcome);
        }

        file_report
    }

    async fn process_supported(&self, source: &SourceDocument) -> FileReport {
        let filename = source.filename();
        let (converted, attempt) = self.convert_with_retry(source);

        let mut file_report = FileReport::new(
            &filename,
            source.format,
            FileOutcome::Answered { questions: 0 },
        );
        file_report.conversion_attempts = attempt.number();

        let artifact = match converted {
            Ok(artifact) => artifact,
            Err(e) => {
                file_report.outcome = FileOutcome::ConversionFailed {
                    message: e.to_string(),
                };
                return file_report;
            }
        };
        file_report.ocr_used = artifact.ocr_used;
        file_report.markdown_path = Some(artifact.path.clone());

        let mut session = match self.index_builder.build_index(&artifact.path).await {
            Ok(session) => session,
            Err(e) => {
                file_report.outcome = index_failure(e);
                return file_report;
            }
        };

        let mut records = Vec::new();
        for question in self.questions() {
            match session.ask(question).await {
                Ok(answer) => {
                    tracing::debug!(
                        "[{}] Answered {:?} ({} chars)",
                        filename,
                        question,
                        answer.answer.chars().count()
                    );
                    records.push(AnswerRecord::new(question, answer.answer));
                }
                Err(e) => {
                    file_report.outcome = FileOutcome::QuestionFailed {
                        question: question.to_string(),
                        message: e.to_string(),
                    };
                    return file_report;
                }
            }
        }

        match self.writer.append(source, &records) {
            Ok(path) => {
                file_report.answer_path = Some(path);
                file_report.outcome = FileOutcome::Answered {
                    questions: records.len(),
                };
            }
            Err(e) => {
                file_report.outcome = FileOutcome::PersistFailed {
                    message: e.to_string(),
                };
            }
        }

        file_report
    }

    /// Convert without OCR, then once more with OCR if that attempt fails
    /// with a conversion error. Returns the result and the last attempt made.
    fn convert_with_retry(&self, source: &SourceDocument) -> (Result<MarkdownArtifact>, ConversionAttempt) {
        let filename = source.filename();
        let md_dir: &PathBuf = &self.config.files.md_dir;
        let mut attempt = ConversionAttempt::first();

        loop {
            match self.converter.convert(source, md_dir, attempt.ocr_enabled()) {
                Ok(artifact) => {
                    tracing::debug!(
                        "[{}] Converted {} (sha256 {})",
                        filename,
                        attempt,
                        artifact.content_hash
                    );
                    return (Ok(artifact), attempt);
                }
                Err(e) if e.is_retryable_conversion() => match attempt.next() {
                    Some(next) => {
                        tracing::warn!(
                            "[{}] Error converting document {}: {}. Retrying {}",
                            filename,
                            attempt,
                            e,
                            next
                        );
                        attempt = next;
                    }
                    None => return (Err(e), attempt),
                },
                Err(e) => return (Err(e), attempt),
            }
        }
    }

    fn questions(&self) -> impl Iterator<Item = &str> {
        self.config
            .questions
            .list
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
    }
}

fn index_failure(e: Error) -> FileOutcome {
    match e {
        Error::EmptyDocument(_) => FileOutcome::EmptyDocument,
        Error::NullIndex(_) => FileOutcome::NullIndex,
        Error::Load { .. } => FileOutcome::LoadFailed {
            message: e.to_string(),
        },
        other => FileOutcome::IndexFailed {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::{ConversionOptions, ConvertedDocument, ConvertedPage};
    use crate::types::DocumentFormat;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    /// Fails every conversion with zero content units and counts calls
    struct BlankEngine {
        calls: Mutex<Vec<bool>>,
    }

    impl ConversionEngine for BlankEngine {
        fn convert(
            &self,
            _path: &Path,
            _format: DocumentFormat,
            options: &ConversionOptions,
        ) -> Result<ConvertedDocument> {
            self.calls.lock().unwrap().push(options.ocr);
            Ok(ConvertedDocument::new(vec![ConvertedPage::from_markdown(1, String::new())]))
        }

        fn name(&self) -> &str {
            "blank"
        }
    }

    struct UnitEmbedder;

    #[async_trait]
    impl EmbeddingProvider for UnitEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "unit"
        }
    }

    struct NoLlm;

    #[async_trait]
    impl LlmProvider for NoLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(Error::llm("not used"))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "none"
        }

        fn model(&self) -> &str {
            "none"
        }
    }

    fn orchestrator(root: &Path, engine: Arc<BlankEngine>) -> BatchOrchestrator {
        let mut config = AppConfig::default();
        config.files.input_dir = root.join("data");
        config.files.output_dir = root.join("answers");
        config.files.md_dir = root.join("markdown");
        BatchOrchestrator::new(config, engine, Arc::new(UnitEmbedder), Arc::new(NoLlm))
    }

    #[tokio::test]
    async fn test_ocr_retry_happens_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/scan.pdf"), b"%PDF").unwrap();

        let engine = Arc::new(BlankEngine {
            calls: Mutex::new(Vec::new()),
        });
        let report = orchestrator(dir.path(), engine.clone()).run().await.unwrap();

        assert_eq!(*engine.calls.lock().unwrap(), vec![false, true]);
        let file = report.get("scan.pdf").unwrap();
        assert_eq!(file.conversion_attempts, 2);
        assert!(matches!(file.outcome, FileOutcome::ConversionFailed { .. }));
        assert!(!dir.path().join("answers/scan_answer.txt").exists());
    }

    #[tokio::test]
    async fn test_discover_is_sorted_and_flat() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(data.join("nested")).unwrap();
        std::fs::write(data.join("b.pdf"), b"x").unwrap();
        std::fs::write(data.join("a.xyz"), b"x").unwrap();
        std::fs::write(data.join("nested/c.pdf"), b"x").unwrap();

        let engine = Arc::new(BlankEngine {
            calls: Mutex::new(Vec::new()),
        });
        let names: Vec<String> = orchestrator(dir.path(), engine)
            .discover()
            .unwrap()
            .iter()
            .map(|d| d.filename())
            .collect();
        assert_eq!(names, vec!["a.xyz", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_missing_input_dir_is_batch_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(BlankEngine {
            calls: Mutex::new(Vec::new()),
        });
        let result = orchestrator(dir.path(), engine).run().await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
