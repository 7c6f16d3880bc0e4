//! End-to-end batch runs with an in-process conversion engine and providers

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use docsumma::config::AppConfig;
use docsumma::ingestion::{ConversionEngine, ConversionOptions, ConvertedDocument, ConvertedPage};
use docsumma::providers::{EmbeddingProvider, LlmProvider};
use docsumma::{BatchOrchestrator, DocumentFormat, FileOutcome, Result};

/// Treats every input as UTF-8 text, one page per form feed. Files whose
/// text starts with `SCANNED:` only yield their text when OCR is on.
#[derive(Default)]
struct TextEngine {
    calls: Mutex<Vec<(String, bool)>>,
}

impl ConversionEngine for TextEngine {
    fn convert(
        &self,
        path: &Path,
        _format: DocumentFormat,
        options: &ConversionOptions,
    ) -> Result<ConvertedDocument> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        self.calls.lock().unwrap().push((name, options.ocr));

        let raw = std::fs::read_to_string(path)?;
        let text = match raw.strip_prefix("SCANNED:") {
            Some(rest) if options.ocr => rest.to_string(),
            Some(_) => String::new(),
            None => raw,
        };

        let pages = text
            .split('\u{c}')
            .enumerate()
            .map(|(i, page)| ConvertedPage::from_markdown(i as u32 + 1, page.to_string()))
            .collect();
        Ok(ConvertedDocument::new(pages))
    }

    fn name(&self) -> &str {
        "text"
    }
}

/// Hashed bag-of-words embedding; text mentioning `nullvector` embeds to zeros
struct BagOfWords;

#[async_trait]
impl EmbeddingProvider for BagOfWords {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; 16];
        if text.contains("nullvector") {
            return Ok(v);
        }
        for word in text.split_whitespace() {
            let bucket = word.bytes().fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize)) % 16;
            v[bucket] += 1.0;
        }
        v[0] += 0.01;
        Ok(v)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }
}

const KEY_POINTS: &str = "QUESTION: What are the key points discussed?";

/// Answers with the first line of retrieved context it was given. With a
/// `fail_marker`, the key-points question fails for documents containing it.
#[derive(Default)]
struct ExtractiveLlm {
    prompts: Mutex<Vec<String>>,
    fail_marker: Option<&'static str>,
}

#[async_trait]
impl LlmProvider for ExtractiveLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(marker) = self.fail_marker {
            if prompt.contains(marker) && prompt.contains(KEY_POINTS) {
                return Err(docsumma::Error::llm("model returned HTTP 500"));
            }
        }
        let excerpt = prompt
            .split("DOCUMENT EXCERPTS:\n")
            .nth(1)
            .and_then(|rest| rest.lines().nth(1))
            .unwrap_or("no excerpt");
        Ok(format!("The document says: {}", excerpt))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "extractive"
    }

    fn model(&self) -> &str {
        "extractive"
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    engine: Arc<TextEngine>,
    llm: Arc<ExtractiveLlm>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_llm(ExtractiveLlm::default())
    }

    fn with_llm(llm: ExtractiveLlm) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        Self {
            dir,
            engine: Arc::new(TextEngine::default()),
            llm: Arc::new(llm),
        }
    }

    fn path(&self, rel: &str) -> std::path::PathBuf {
        self.dir.path().join(rel)
    }

    fn write_input(&self, name: &str, content: &str) {
        std::fs::write(self.path("data").join(name), content).unwrap();
    }

    fn orchestrator(&self) -> BatchOrchestrator {
        let mut config = AppConfig::default();
        config.files.input_dir = self.path("data");
        config.files.output_dir = self.path("answers");
        config.files.md_dir = self.path("markdown");
        BatchOrchestrator::new(
            config,
            self.engine.clone(),
            Arc::new(BagOfWords),
            self.llm.clone(),
        )
    }
}

fn report_text() -> String {
    let mut text = String::from("# Annual Report\n\n");
    for i in 0..40 {
        text.push_str(&format!(
            "Section {} explains how the regional offices reduced costs while revenue grew steadily.\n\n",
            i
        ));
    }
    text
}

#[tokio::test]
async fn test_good_pdf_answered_and_unknown_extension_skipped() {
    let fx = Fixture::new();
    fx.write_input("report.pdf", &report_text());
    fx.write_input("notes.xyz", "plain notes");

    let report = fx.orchestrator().run().await.unwrap();

    assert_eq!(report.total(), 2);
    assert_eq!(report.answered(), 1);
    assert_eq!(report.skipped(), 1);
    assert!(matches!(
        report.get("notes.xyz").unwrap().outcome,
        FileOutcome::Unsupported { ref extension } if extension == ".xyz"
    ));

    let markdown = std::fs::read_to_string(fx.path("markdown/report_converted.md")).unwrap();
    assert!(markdown.starts_with("# Annual Report"));

    let answers = std::fs::read_to_string(fx.path("answers/report_answer.txt")).unwrap();
    assert!(answers.contains("What is the main topic of this document?\n"));
    assert!(answers.contains("Can you summarize the document?\nThe document says: "));
    assert!(answers.ends_with("\n\n"));

    assert!(!fx.path("answers/notes_answer.txt").exists());
    assert!(!fx.path("markdown/notes_converted.md").exists());
    // the engine never saw the unsupported file
    assert!(fx.engine.calls.lock().unwrap().iter().all(|(name, _)| name != "notes.xyz"));
}

#[tokio::test]
async fn test_scanned_pdf_succeeds_on_ocr_retry() {
    let fx = Fixture::new();
    fx.write_input("scan.pdf", &format!("SCANNED:{}", report_text()));

    let report = fx.orchestrator().run().await.unwrap();

    let calls = fx.engine.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![("scan.pdf".to_string(), false), ("scan.pdf".to_string(), true)]);

    let file = report.get("scan.pdf").unwrap();
    assert_eq!(file.conversion_attempts, 2);
    assert!(file.ocr_used);
    assert!(file.outcome.is_answered());

    let markdown = std::fs::read_to_string(fx.path("markdown/scan_converted.md")).unwrap();
    assert!(!markdown.trim().is_empty());
    assert!(fx.path("answers/scan_answer.txt").exists());
}

#[tokio::test]
async fn test_indexing_failure_does_not_stop_the_batch() {
    let fx = Fixture::new();
    fx.write_input("a_broken.docx", "nullvector nullvector nullvector");
    fx.write_input("b_good.html", &report_text());

    let report = fx.orchestrator().run().await.unwrap();

    assert_eq!(report.get("a_broken.docx").unwrap().outcome, FileOutcome::NullIndex);
    assert!(report.get("b_good.html").unwrap().outcome.is_answered());
    assert!(fx.path("markdown/a_broken_converted.md").exists());
    assert!(!fx.path("answers/a_broken_answer.txt").exists());
    assert!(fx.path("answers/b_good_answer.txt").exists());
}

#[tokio::test]
async fn test_failed_question_writes_no_answers_and_batch_continues() {
    let fx = Fixture::with_llm(ExtractiveLlm {
        fail_marker: Some("unstable"),
        ..ExtractiveLlm::default()
    });
    fx.write_input("a_flaky.pdf", "# Flaky\n\nThis unstable memo covers the budget.");
    fx.write_input("b_good.pdf", &report_text());

    let report = fx.orchestrator().run().await.unwrap();

    match &report.get("a_flaky.pdf").unwrap().outcome {
        FileOutcome::QuestionFailed { question, message } => {
            assert_eq!(question, "What are the key points discussed?");
            assert!(message.contains("HTTP 500"), "{}", message);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    // the first question succeeded but nothing is persisted for the document
    assert!(!fx.path("answers/a_flaky_answer.txt").exists());
    assert!(fx.path("markdown/a_flaky_converted.md").exists());

    assert!(report.get("b_good.pdf").unwrap().outcome.is_answered());
    assert!(fx.path("answers/b_good_answer.txt").exists());
    assert_eq!(report.answered(), 1);
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn test_rerun_appends_answers() {
    let fx = Fixture::new();
    fx.write_input("report.pdf", &report_text());

    fx.orchestrator().run().await.unwrap();
    let first = std::fs::read_to_string(fx.path("answers/report_answer.txt")).unwrap();

    fx.orchestrator().run().await.unwrap();
    let second = std::fs::read_to_string(fx.path("answers/report_answer.txt")).unwrap();

    assert_eq!(second.len(), first.len() * 2);
    assert!(second.starts_with(&first));
}

#[tokio::test]
async fn test_later_questions_see_earlier_answers() {
    let fx = Fixture::new();
    fx.write_input("report.pdf", &report_text());

    fx.orchestrator().run().await.unwrap();

    let prompts = fx.llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 3);
    assert!(!prompts[0].contains("CONVERSATION SO FAR"));
    assert!(prompts[2].contains("Human: What is the main topic of this document?"));
    assert!(prompts[2].contains("Human: What are the key points discussed?"));
}
