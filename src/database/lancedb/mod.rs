// LanceDB vector database module
// Handles vector storage and similarity search for rule chunk embeddings


pub mod vector_store;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embeddings::DocumentChunk;

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier for this row
    pub id: String,
    /// The vector embedding of the chunk content
    pub vector: Vec<f32>,
    /// Metadata about the chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Metadata for a chunk stored alongside its embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Rules file the chunk came from
    pub source: String,
    /// The actual text content of the chunk
    pub content: String,
    /// Index of this chunk within its source file
    pub chunk_index: u32,
    /// RFC 3339 timestamp of when the embedding was stored
    pub created_at: String,
}

impl ChunkRecord {
    /// Pair a chunk with its embedding under a fresh id
    #[inline]
    pub fn from_chunk(chunk: &DocumentChunk, vector: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vector,
            metadata: ChunkMetadata {
                source: chunk.source.display().to_string(),
                content: chunk.content.clone(),
                chunk_index: u32::try_from(chunk.chunk_index).unwrap_or(u32::MAX),
                created_at: Utc::now().to_rfc3339(),
            },
        }
    }
}
