// Embeddings module
// Splits rule documents into chunks and turns text into vectors


#[cfg(test)]
pub(crate) mod testing;

pub mod splitter;

pub use splitter::{DocumentChunk, SplitterConfig, split_documents, split_text};

use tracing::debug;

use crate::config::OllamaConfig;
use crate::ollama::{OllamaClient, OllamaError};
use crate::{RagError, Result};

/// Turns text into vectors. Queries and documents must go through the same
/// model for their vectors to be comparable.
pub trait Embedder: Send + Sync {
    /// Identifier of the model producing the vectors, recorded in the index
    fn model_id(&self) -> &str;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| {
                RagError::Embedding(OllamaError::InvalidResponse(
                    "no vector returned".to_string(),
                ))
            })
    }
}

/// [`Embedder`] backed by an Ollama embedding model. Each `embed_batch` call
/// is one `/api/embed` request; callers choose the batch size.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    #[inline]
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    #[inline]
    pub fn from_config(config: &OllamaConfig) -> Result<Self> {
        let client = OllamaClient::new(config).map_err(RagError::Embedding)?;
        Ok(Self::new(client, config.embedding_model.clone()))
    }
}

impl Embedder for OllamaEmbedder {
    #[inline]
    fn model_id(&self) -> &str {
        &self.model
    }

    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!("Embedding batch of {} texts", texts.len());
        self.client
            .embed(&self.model, texts)
            .map_err(RagError::Embedding)
    }
}
