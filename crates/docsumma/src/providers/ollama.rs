//! Ollama-based providers for embeddings and LLM
//!
//! Wraps `OllamaClient` to implement the provider traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::generation::OllamaClient;

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(OllamaClient::new(config)?),
        })
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>) -> Self {
        Self { client }
    }

    pub fn model(&self) -> &str {
        &self.client.config().embed_model
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(OllamaClient::new(config)?),
            model: config.model.clone(),
        })
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Combined Ollama provider that shares a single client for both embeddings and LLM
pub struct OllamaProvider {
    client: Arc<OllamaClient>,
    embedder: Arc<OllamaEmbedder>,
    llm: Arc<OllamaLlm>,
}

impl OllamaProvider {
    /// Create a new combined Ollama provider
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Arc::new(OllamaClient::new(config)?);
        Ok(Self {
            embedder: Arc::new(OllamaEmbedder::from_client(Arc::clone(&client))),
            llm: Arc::new(OllamaLlm::from_client(Arc::clone(&client), config.model.clone())),
            client,
        })
    }

    /// Get the shared HTTP client
    pub fn client(&self) -> &Arc<OllamaClient> {
        &self.client
    }

    /// Get the embedding provider
    pub fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        self.embedder.clone()
    }

    /// Get the LLM provider
    pub fn llm(&self) -> Arc<dyn LlmProvider> {
        self.llm.clone()
    }

    /// Probe the server and check that both configured models are installed.
    /// Returns the list of problems found; empty means ready.
    pub async fn readiness_problems(&self) -> Vec<String> {
        let config = self.client.config();

        if !self.client.health_check().await.unwrap_or(false) {
            return vec![format!(
                "Ollama is not reachable at {}. Start it with `ollama serve`.",
                config.base_url
            )];
        }

        let installed = match self.client.list_models().await {
            Ok(models) => models,
            Err(e) => return vec![e.to_string()],
        };

        [&config.model, &config.embed_model]
            .into_iter()
            .filter(|wanted| !model_installed(&installed, wanted))
            .map(|wanted| format!("Model {} is not installed. Run `ollama pull {}`.", wanted, wanted))
            .collect()
    }
}

/// Ollama reports `name:tag`; a configured name without a tag means `:latest`
fn model_installed(installed: &[String], wanted: &str) -> bool {
    let wanted_full = if wanted.contains(':') {
        wanted.to_string()
    } else {
        format!("{}:latest", wanted)
    };
    installed.iter().any(|m| m == wanted || *m == wanted_full)
}
