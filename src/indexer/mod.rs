// Index builder
// Loads rule files, splits them, embeds the chunks and persists them in LanceDB


pub mod manifest;

pub use manifest::{IndexManifest, MANIFEST_FILE_NAME};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::database::{ChunkRecord, VectorStore};
use crate::embeddings::{DocumentChunk, Embedder, split_documents};
use crate::loader::load_documents;
use crate::ollama::OllamaError;
use crate::{RagError, Result};

/// Summary of a completed index build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub elapsed: Duration,
}

/// What [`ensure_index`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// A new index was built
    Built(IndexStats),
    /// The persist directory already existed and was left untouched
    Reused,
}

/// Build the index unless the persist directory already exists
#[inline]
pub async fn ensure_index<E: Embedder>(config: &Config, embedder: &E) -> Result<IndexOutcome> {
    let persist_dir = &config.rag.persist_dir;

    if persist_dir.exists() {
        info!("Reusing existing index at {}", persist_dir.display());
        return Ok(IndexOutcome::Reused);
    }

    build_index(config, embedder).await.map(IndexOutcome::Built)
}

/// Discard any existing index and build a new one
#[inline]
pub async fn rebuild_index<E: Embedder>(config: &Config, embedder: &E) -> Result<IndexStats> {
    let persist_dir = &config.rag.persist_dir;

    if persist_dir.exists() {
        info!("Removing existing index at {}", persist_dir.display());
        std::fs::remove_dir_all(persist_dir)?;
    }

    build_index(config, embedder).await
}

/// Load, split, embed and persist every rule file.
///
/// The persist directory must not exist yet. If persisting fails the
/// directory is removed again so the next run starts from scratch.
#[inline]
pub async fn build_index<E: Embedder>(config: &Config, embedder: &E) -> Result<IndexStats> {
    let started = Instant::now();
    let rules_dir = &config.rag.rules_dir;
    let persist_dir = &config.rag.persist_dir;

    if persist_dir.exists() {
        return Err(RagError::Database(format!(
            "Index directory {} already exists",
            persist_dir.display()
        )));
    }

    info!("Building index from {}", rules_dir.display());

    let documents = load_documents(rules_dir)?;
    let chunks = split_documents(&documents, &config.splitter_config());
    if chunks.is_empty() {
        return Err(RagError::NoRules(rules_dir.clone()));
    }
    info!(
        "Split {} documents into {} chunks",
        documents.len(),
        chunks.len()
    );

    let vectors = embed_chunks(embedder, &chunks, config.ollama.batch_size as usize)?;
    if vectors.len() != chunks.len() {
        return Err(RagError::Embedding(OllamaError::InvalidResponse(format!(
            "expected {} vectors, got {}",
            chunks.len(),
            vectors.len()
        ))));
    }
    let dimension = vectors.first().map_or(0, Vec::len);

    let manifest = IndexManifest {
        embedding_model: embedder.model_id().to_string(),
        dimension,
        documents: documents.len(),
        chunks: chunks.len(),
        chunk_size: config.rag.chunk_size,
        chunk_overlap: config.rag.chunk_overlap,
        created_at: Utc::now(),
    };

    if let Err(e) = persist(persist_dir, &chunks, vectors, &manifest).await {
        warn!(
            "Index build failed, removing partial index at {}",
            persist_dir.display()
        );
        if let Err(cleanup) = std::fs::remove_dir_all(persist_dir) {
            warn!("Failed to remove partial index: {}", cleanup);
        }
        return Err(e);
    }

    let stats = IndexStats {
        documents: manifest.documents,
        chunks: manifest.chunks,
        dimension,
        elapsed: started.elapsed(),
    };
    info!(
        "Indexed {} chunks from {} documents in {:.2?}",
        stats.chunks, stats.documents, stats.elapsed
    );

    Ok(stats)
}

fn embed_chunks<E: Embedder>(
    embedder: &E,
    chunks: &[DocumentChunk],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let bar = if console::user_attended_stderr() {
        let style = ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding chunks")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        ProgressBar::new(chunks.len() as u64).with_style(style)
    } else {
        ProgressBar::hidden()
    };

    let mut vectors = Vec::with_capacity(chunks.len());

    for batch in chunks.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.content.clone()).collect();
        let batch_vectors = embedder.embed_batch(&texts)?;
        debug!("Embedded {} chunks", batch_vectors.len());

        bar.inc(batch.len() as u64);
        vectors.extend(batch_vectors);
    }

    bar.finish_and_clear();
    Ok(vectors)
}

async fn persist(
    persist_dir: &Path,
    chunks: &[DocumentChunk],
    vectors: Vec<Vec<f32>>,
    manifest: &IndexManifest,
) -> Result<()> {
    let records: Vec<ChunkRecord> = chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| ChunkRecord::from_chunk(chunk, vector))
        .collect();

    let store = VectorStore::create(persist_dir, manifest.dimension).await?;
    store.add_chunks(&records).await?;
    manifest.save(persist_dir)
}
