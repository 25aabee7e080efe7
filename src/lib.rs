use std::path::PathBuf;

use thiserror::Error;

use crate::ollama::OllamaError;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rules directory not found: {}", .0.display())]
    RulesNotFound(PathBuf),

    #[error("No .txt rule files found under {}", .0.display())]
    NoRules(PathBuf),

    #[error("Index not found at {}; build it first", .0.display())]
    IndexMissing(PathBuf),

    #[error("Index at {} is incomplete or corrupt: {reason}", .path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error(
        "Index was built with embedding model '{indexed}' but '{configured}' is configured; rebuild the index or change the model"
    )]
    EmbeddingModelMismatch { indexed: String, configured: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Embedding error: {0}")]
    Embedding(#[source] OllamaError),

    #[error("Model unreachable: {0}")]
    ModelUnreachable(String),

    #[error("Malformed model reply: {0}")]
    MalformedReply(String),

    #[error("Generation error: {0}")]
    Generation(#[source] OllamaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl RagError {
    /// Classify a failed generation call so callers can tell an unreachable
    /// server apart from a reply they could not use.
    #[inline]
    pub fn generation(error: OllamaError) -> Self {
        match error {
            OllamaError::Connection(message) => Self::ModelUnreachable(message),
            OllamaError::MissingField(_) | OllamaError::InvalidResponse(_) => {
                Self::MalformedReply(error.to_string())
            }
            other => Self::Generation(other),
        }
    }
}

pub mod ask;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod indexer;
pub mod loader;
pub mod ollama;
pub mod rag;
