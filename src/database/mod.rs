// Database module
// LanceDB-backed storage for chunk embeddings

pub mod lancedb;

use async_trait::async_trait;

pub use self::lancedb::vector_store::{SearchResult, VectorStore};
pub use self::lancedb::{ChunkMetadata, ChunkRecord};

use crate::Result;

/// Nearest-neighbour lookup over stored chunk vectors
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return at most `limit` chunks closest to `query_vector`, nearest first.
    /// Ties are ordered however the backing store orders them.
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<SearchResult>>;
}
