use console::style;

use crate::ask::{DEFAULT_QUESTION, ask};
use crate::config::Config;
use crate::database::VectorStore;
use crate::embeddings::OllamaEmbedder;
use crate::indexer::{IndexManifest, IndexOutcome, IndexStats, ensure_index, rebuild_index};
use crate::ollama::OllamaClient;
use crate::rag::RagPipeline;
use crate::{RagError, Result};

/// Code snippets analysed when no subcommand is given
pub const DEMO_QUERIES: [&str; 2] = [
    "if (value | 0) { console.log('Error'); }",
    "flags = MASK_A | MASK_B;",
];

/// Send one question straight to the generation model and print the reply
#[inline]
pub fn run_ask(config: &Config, question: Option<&str>) -> Result<()> {
    let question = question.unwrap_or(DEFAULT_QUESTION);
    let client = OllamaClient::new(&config.ollama)
        .map_err(RagError::generation)?
        .without_timeout();

    println!("{} {}", style("Question:").bold(), question);
    let answer = ask(&client, &config.ollama.model, question);
    println!("{} {}", style("Answer:").bold().green(), answer.trim());
    Ok(())
}

/// Build the rules index, or rebuild it when `force` is set
#[inline]
pub async fn run_index(config: &Config, force: bool) -> Result<()> {
    let embedder = OllamaEmbedder::from_config(&config.ollama)?;

    if force {
        let stats = rebuild_index(config, &embedder).await?;
        print_stats(&stats);
        return Ok(());
    }

    report_outcome(config, &ensure_index(config, &embedder).await?);
    Ok(())
}

/// Analyse a code snippet against the indexed rules
#[inline]
pub async fn run_query(config: &Config, code: &str) -> Result<()> {
    let pipeline = RagPipeline::open(config).await?;
    let answer = pipeline.query(code).await?;

    println!("{}", answer.trim());
    Ok(())
}

/// Build the index if needed, then analyse the demo snippets
#[inline]
pub async fn run_demo(config: &Config) -> Result<()> {
    let embedder = OllamaEmbedder::from_config(&config.ollama)?;
    report_outcome(config, &ensure_index(config, &embedder).await?);

    let pipeline = RagPipeline::open(config).await?;

    for code in DEMO_QUERIES {
        println!();
        println!("{} {}", style("Code:").bold().cyan(), code);
        let answer = pipeline.query(code).await?;
        println!("{}", answer.trim());
    }

    Ok(())
}

fn report_outcome(config: &Config, outcome: &IndexOutcome) {
    match outcome {
        IndexOutcome::Built(stats) => print_stats(stats),
        IndexOutcome::Reused => println!(
            "{} Using existing index at {}",
            style("✓").green(),
            config.rag.persist_dir.display()
        ),
    }
}

fn print_stats(stats: &IndexStats) {
    println!(
        "{} Indexed {} chunks from {} rule files ({} dimensions) in {:.1?}",
        style("✓").green(),
        stats.chunks,
        stats.documents,
        stats.dimension,
        stats.elapsed
    );
}

/// Print Ollama connectivity and index details
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("{}", style("Rules RAG Status").bold());
    println!("{}", "=".repeat(40));

    println!();
    println!("{}", style("Ollama:").bold().yellow());
    match OllamaClient::new(&config.ollama) {
        Ok(client) => {
            let client = client.with_retry_attempts(1);
            for model in [&config.ollama.model, &config.ollama.embedding_model] {
                match client.health_check(model) {
                    Ok(()) => println!("  {} {} is available", style("✓").green(), model),
                    Err(e) => println!("  {} {}: {}", style("✗").red(), model, e),
                }
            }
        }
        Err(e) => println!("  {} {}", style("✗").red(), e),
    }

    println!();
    println!("{}", style("Index:").bold().yellow());
    let persist_dir = &config.rag.persist_dir;
    println!("  Location: {}", persist_dir.display());

    let manifest = match IndexManifest::load(persist_dir) {
        Ok(manifest) => manifest,
        Err(RagError::IndexMissing(_)) => {
            println!("  {} not built yet", style("-").dim());
            return Ok(());
        }
        Err(e) => {
            println!("  {} {}", style("✗").red(), e);
            return Ok(());
        }
    };

    println!("  Embedding model: {}", manifest.embedding_model);
    println!("  Dimensions: {}", manifest.dimension);
    println!("  Rule files: {}", manifest.documents);
    println!(
        "  Chunk size/overlap: {}/{}",
        manifest.chunk_size, manifest.chunk_overlap
    );
    println!("  Built: {}", manifest.created_at.to_rfc3339());

    let stored = match VectorStore::open(persist_dir).await {
        Ok(store) => store.count_chunks().await,
        Err(e) => Err(e),
    };
    match stored {
        Ok(count) => println!("  Stored chunks: {}", count),
        Err(e) => println!("  {} {}", style("✗").red(), e),
    }

    if let Err(e) = manifest.ensure_embedding_model(&config.ollama.embedding_model) {
        println!("  {} {}", style("!").yellow(), e);
    }

    Ok(())
}
