//! Deterministic embedders for tests that should not need a model server

use std::sync::atomic::{AtomicUsize, Ordering};

use super::Embedder;
use crate::ollama::OllamaError;
use crate::{RagError, Result};

pub(crate) const KEYWORD_DIMENSION: usize = 64;

/// Bag-of-words embedder: each lowercase word bumps one hashed component, so
/// texts sharing words end up close under cosine distance.
#[derive(Debug)]
pub(crate) struct KeywordEmbedder {
    model: String,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub(crate) fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed_batch` calls so far
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; KEYWORD_DIMENSION];
        // Keeps texts without words away from the zero vector
        vector[KEYWORD_DIMENSION - 1] = 0.01;

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(2_166_136_261_u32, |hash, byte| {
                    (hash ^ u32::from(byte)).wrapping_mul(16_777_619)
                });
            vector[hash as usize % (KEYWORD_DIMENSION - 1)] += 1.0;
        }

        vector
    }
}

impl Embedder for KeywordEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|text| Self::vector_for(text)).collect())
    }
}

/// Embedder whose every call fails as if the server were down
#[derive(Debug)]
pub(crate) struct UnreachableEmbedder;

impl Embedder for UnreachableEmbedder {
    fn model_id(&self) -> &str {
        "unreachable"
    }

    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RagError::Embedding(OllamaError::Connection(
            "connection refused".to_string(),
        )))
    }
}

/// Embedder returning vectors of a different length for every text
#[derive(Debug)]
pub(crate) struct RaggedEmbedder;

impl Embedder for RaggedEmbedder {
    fn model_id(&self) -> &str {
        "ragged"
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok((0..texts.len()).map(|i| vec![1.0; i + 1]).collect())
    }
}

/// Embedder that drops the vector for the first text of every batch
#[derive(Debug)]
pub(crate) struct ShortEmbedder;

impl Embedder for ShortEmbedder {
    fn model_id(&self) -> &str {
        "short"
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .skip(1)
            .map(|text| KeywordEmbedder::vector_for(text))
            .collect())
    }
}
