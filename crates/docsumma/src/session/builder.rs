//! Builds a QA session from a converted markdown file

use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::ingestion::{MarkdownLoader, RecursiveCharacterSplitter};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::VectorIndex;

use super::qa::QaSession;

/// Load, split, embed and index one markdown document
pub struct IndexBuilder {
    splitter: RecursiveCharacterSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl IndexBuilder {
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            splitter: RecursiveCharacterSplitter::new(
                config.chunking.chunk_size,
                config.chunking.chunk_overlap,
            ),
            embedder,
            llm,
            top_k: config.retrieval.top_k,
        }
    }

    /// Build a fresh session for `markdown_path`.
    ///
    /// Errors: `Load` for unreadable input, `EmptyDocument` when nothing
    /// survives splitting, `NullIndex` when no embedding is usable, and
    /// provider errors as returned.
    pub async fn build_index(&self, markdown_path: &Path) -> Result<QaSession> {
        let name = markdown_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| markdown_path.display().to_string());

        let loaded = MarkdownLoader::load(markdown_path)?;
        let chunks = self.splitter.split_into_chunks(&loaded.text);

        if chunks.is_empty() {
            return Err(Error::EmptyDocument(markdown_path.to_path_buf()));
        }

        tracing::info!(
            "[{}] Split {} ({} chars) into {} chunks",
            name,
            loaded.source,
            loaded.text.chars().count(),
            chunks.len()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            tracing::warn!(
                "[{}] {} embedder returned {} vectors for {} chunks",
                name,
                self.embedder.name(),
                embeddings.len(),
                chunks.len()
            );
        }

        let index = VectorIndex::build(chunks.into_iter().zip(embeddings))
            .ok_or_else(|| Error::NullIndex(markdown_path.to_path_buf()))?;

        tracing::info!(
            "[{}] Indexed {} chunks ({} dimensions)",
            name,
            index.len(),
            index.dimensions()
        );

        Ok(QaSession::new(
            name,
            index,
            Arc::clone(&self.embedder),
            Arc::clone(&self.llm),
            self.top_k,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct LengthEmbedder {
        zero: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.zero {
                Ok(vec![0.0; 3])
            } else {
                Ok(vec![text.len() as f32, 1.0, 0.5])
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("echo".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    fn builder(zero: bool) -> IndexBuilder {
        IndexBuilder::new(
            &AppConfig::default(),
            Arc::new(LengthEmbedder { zero }),
            Arc::new(EchoLlm),
        )
    }

    #[tokio::test]
    async fn test_builds_session_for_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report_converted.md");
        let body: String = (0..30)
            .map(|i| format!("Paragraph {} discusses the findings in some detail.\n\n", i))
            .collect();
        std::fs::write(&path, format!("# Report\n\n{}", body)).unwrap();

        let mut session = builder(false).build_index(&path).await.unwrap();
        assert!(session.index().len() > 1);
        assert_eq!(session.ask("What is it?").await.unwrap().answer, "echo");
    }

    #[tokio::test]
    async fn test_blank_markdown_is_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank_converted.md");
        std::fs::write(&path, "\n\n   \n").unwrap();

        let err = builder(false).build_index(&path).await.err().unwrap();
        assert!(matches!(err, Error::EmptyDocument(_)));
    }

    #[tokio::test]
    async fn test_zero_vectors_are_null_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc_converted.md");
        std::fs::write(&path, "Some text.").unwrap();

        let err = builder(true).build_index(&path).await.err().unwrap();
        assert!(matches!(err, Error::NullIndex(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let err = builder(false)
            .build_index(Path::new("/nonexistent/doc_converted.md"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Load { .. }));
    }
}
