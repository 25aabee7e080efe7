
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{RagError, Result};

pub const MANIFEST_FILE_NAME: &str = "index.toml";

/// Describes how a persisted index was built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Model that produced the stored vectors
    pub embedding_model: String,
    pub dimension: usize,
    pub documents: usize,
    pub chunks: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub created_at: DateTime<Utc>,
}

impl IndexManifest {
    #[inline]
    pub fn path(persist_dir: &Path) -> PathBuf {
        persist_dir.join(MANIFEST_FILE_NAME)
    }

    /// Read the manifest of the index in `persist_dir`
    #[inline]
    pub fn load(persist_dir: &Path) -> Result<Self> {
        if !persist_dir.is_dir() {
            return Err(RagError::IndexMissing(persist_dir.to_path_buf()));
        }

        let path = Self::path(persist_dir);
        let corrupt = |reason: String| RagError::IndexCorrupt {
            path: persist_dir.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(&path)
            .map_err(|e| corrupt(format!("cannot read {}: {}", MANIFEST_FILE_NAME, e)))?;

        toml::from_str(&content)
            .map_err(|e| corrupt(format!("cannot parse {}: {}", MANIFEST_FILE_NAME, e)))
    }

    #[inline]
    pub fn save(&self, persist_dir: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RagError::Database(format!("Failed to serialize index manifest: {}", e)))?;
        fs::write(Self::path(persist_dir), content)?;
        Ok(())
    }

    /// Fail unless the index was built with `configured`
    #[inline]
    pub fn ensure_embedding_model(&self, configured: &str) -> Result<()> {
        if self.embedding_model == configured {
            Ok(())
        } else {
            Err(RagError::EmbeddingModelMismatch {
                indexed: self.embedding_model.clone(),
                configured: configured.to_string(),
            })
        }
    }
}
