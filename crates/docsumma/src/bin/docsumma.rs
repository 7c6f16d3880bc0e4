//! docsumma command-line binary
//!
//! Run with: cargo run -p docsumma -- --config docsumma.toml

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docsumma::{
    config::AppConfig,
    ingestion::NativeEngine,
    providers::OllamaProvider,
    BatchOrchestrator, FileOutcome,
};

/// Convert documents to markdown and answer questions about each one
#[derive(Debug, Parser)]
#[command(name = "docsumma", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the source documents
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory receiving answer files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Directory receiving converted markdown
    #[arg(long)]
    md_dir: Option<PathBuf>,

    /// Generation model served by Ollama
    #[arg(long)]
    model: Option<String>,

    /// Do not probe the Ollama server before running
    #[arg(long)]
    skip_health_check: bool,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(dir) = &self.input_dir {
            config.files.input_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.files.output_dir = dir.clone();
        }
        if let Some(dir) = &self.md_dir {
            config.files.md_dir = dir.clone();
        }
        if let Some(model) = &self.model {
            config.model.model = model.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docsumma=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.load_config()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Input: {}", config.files.input_dir.display());
    tracing::info!("  - Answers: {}", config.files.output_dir.display());
    tracing::info!("  - Markdown: {}", config.files.md_dir.display());
    tracing::info!("  - LLM model: {}", config.model.model);
    tracing::info!("  - Embedding model: {}", config.model.embed_model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap, top {}",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
        config.retrieval.top_k
    );

    let provider = OllamaProvider::new(&config.model)?;

    if !args.skip_health_check {
        tracing::info!("Checking Ollama at {}...", config.model.base_url);
        let problems = provider.readiness_problems().await;
        if problems.is_empty() {
            tracing::info!("Ollama is running with the configured models");
        } else {
            for problem in &problems {
                tracing::warn!("{}", problem);
            }
            tracing::warn!("Please set up Ollama:");
            tracing::warn!("  1. Install: https://ollama.com/download");
            tracing::warn!("  2. Start: ollama serve");
            tracing::warn!(
                "  3. Pull models: ollama pull {} && ollama pull {}",
                config.model.embed_model,
                config.model.model
            );
        }
    }

    let engine = Arc::new(NativeEngine::new(&config.ocr));
    let orchestrator = BatchOrchestrator::new(config, engine, provider.embedder(), provider.llm());

    let documents = orchestrator.discover()?;

    let progress = ProgressBar::new(documents.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let report = orchestrator
        .run_documents(documents, |file| {
            progress.set_message(file.filename.clone());
            progress.inc(1);
        })
        .await;

    progress.finish_and_clear();

    println!();
    println!("{}", style("Summary").bold());
    for file in &report.files {
        let marker = match &file.outcome {
            FileOutcome::Answered { .. } => style("ok  ").green(),
            FileOutcome::Unsupported { .. } => style("skip").yellow(),
            _ => style("fail").red(),
        };
        let ocr = if file.ocr_used { " (ocr)" } else { "" };
        println!("  {} {}{}: {}", marker, file.filename, ocr, file.outcome);
    }
    println!();
    println!(
        "  {} answered, {} skipped, {} failed, {} OCR retries in {:.1}s",
        style(report.answered()).green().bold(),
        style(report.skipped()).yellow(),
        style(report.failed()).red(),
        report.ocr_retries(),
        report.elapsed.as_secs_f64()
    );
    println!(
        "  Answers written to {}",
        orchestrator.config().files.output_dir.display()
    );

    Ok(())
}
