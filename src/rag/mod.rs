//! Retrieval-augmented answering over the persisted rules index.
//!
//! A [`RagPipeline`] embeds the question, pulls the nearest rule chunks out of
//! a [`VectorIndex`], renders them into a [`PromptTemplate`] and hands the
//! prompt to a [`Generator`].


pub mod prompt;

pub use prompt::{DEFAULT_TEMPLATE, PromptTemplate};

use tracing::{debug, info};

use crate::config::{Config, OllamaConfig};
use crate::database::{SearchResult, VectorIndex, VectorStore};
use crate::embeddings::{Embedder, OllamaEmbedder};
use crate::indexer::IndexManifest;
use crate::ollama::{ChatMessage, OllamaClient};
use crate::{RagError, Result};

/// Produces an answer for a fully rendered prompt
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// [`Generator`] sending the prompt as a single user message to `/api/chat`
#[derive(Debug, Clone)]
pub struct OllamaChat {
    client: OllamaClient,
    model: String,
    temperature: f32,
}

impl OllamaChat {
    #[inline]
    pub fn new(client: OllamaClient, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    #[inline]
    pub fn from_config(config: &OllamaConfig) -> Result<Self> {
        let client = OllamaClient::new(config).map_err(RagError::generation)?;
        Ok(Self::new(client, config.model.clone(), config.temperature))
    }
}

impl Generator for OllamaChat {
    #[inline]
    fn generate(&self, prompt: &str) -> Result<String> {
        self.client
            .chat(&self.model, &[ChatMessage::user(prompt)], self.temperature)
            .map_err(RagError::generation)
    }
}

/// Finds the rule chunks closest to a question
#[derive(Debug)]
pub struct Retriever<E, I> {
    embedder: E,
    index: I,
    top_k: usize,
}

impl<E: Embedder, I: VectorIndex> Retriever<E, I> {
    #[inline]
    pub fn new(embedder: E, index: I, top_k: usize) -> Self {
        Self {
            embedder,
            index,
            top_k: top_k.max(1),
        }
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Nearest chunks first, at most `top_k` of them
    #[inline]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        let query_vector = self.embedder.embed(question)?;
        let results = self.index.search(&query_vector, self.top_k).await?;
        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }
}

/// Join retrieved chunk texts into the prompt's context block
#[inline]
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|result| result.chunk_metadata.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct RagPipeline<E, I, G> {
    retriever: Retriever<E, I>,
    generator: G,
    template: PromptTemplate,
}

impl RagPipeline<OllamaEmbedder, VectorStore, OllamaChat> {
    /// Open the persisted index named in `config`, talking to Ollama for
    /// embeddings and answers.
    #[inline]
    pub async fn open(config: &Config) -> Result<Self> {
        let embedder = OllamaEmbedder::from_config(&config.ollama)?;
        let generator = OllamaChat::from_config(&config.ollama)?;
        Self::open_with(config, embedder, generator).await
    }
}

impl<E: Embedder, G: Generator> RagPipeline<E, VectorStore, G> {
    /// Open the persisted index, refusing it when it was built with a
    /// different embedding model than `embedder`.
    #[inline]
    pub async fn open_with(config: &Config, embedder: E, generator: G) -> Result<Self> {
        let persist_dir = &config.rag.persist_dir;

        let manifest = IndexManifest::load(persist_dir)?;
        manifest.ensure_embedding_model(embedder.model_id())?;

        let store = VectorStore::open(persist_dir).await?;
        if store.vector_dimension() != manifest.dimension {
            return Err(RagError::IndexCorrupt {
                path: persist_dir.clone(),
                reason: format!(
                    "manifest records {} dimensions but the table has {}",
                    manifest.dimension,
                    store.vector_dimension()
                ),
            });
        }

        info!(
            "Opened index at {} ({} chunks, model {})",
            persist_dir.display(),
            manifest.chunks,
            manifest.embedding_model
        );

        Ok(Self::new(
            Retriever::new(embedder, store, config.rag.top_k),
            generator,
            PromptTemplate::default(),
        ))
    }
}

impl<E: Embedder, I: VectorIndex, G: Generator> RagPipeline<E, I, G> {
    #[inline]
    pub fn new(retriever: Retriever<E, I>, generator: G, template: PromptTemplate) -> Self {
        Self {
            retriever,
            generator,
            template,
        }
    }

    #[inline]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    #[inline]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        self.retriever.retrieve(question).await
    }

    /// Render the prompt for `question` from already retrieved chunks
    #[inline]
    pub fn build_prompt(&self, question: &str, results: &[SearchResult]) -> String {
        self.template.render(&format_context(results), question)
    }

    /// Answer `question` from the rules most similar to it
    #[inline]
    pub async fn query(&self, question: &str) -> Result<String> {
        let results = self.retrieve(question).await?;
        for result in &results {
            debug!(
                "Context chunk {}#{} (similarity {:.3})",
                result.chunk_metadata.source,
                result.chunk_metadata.chunk_index,
                result.similarity_score
            );
        }

        let prompt = self.build_prompt(question, &results);
        debug!("Prompt length: {} characters", prompt.chars().count());

        self.generator.generate(&prompt)
    }
}
