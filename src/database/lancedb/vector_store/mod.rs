
use super::{ChunkMetadata, ChunkRecord};
use crate::{RagError, Result, database::VectorIndex};
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "rules";

/// Vector database store using LanceDB for similarity search
pub struct VectorStore {
    connection: Connection,
    path: PathBuf,
    vector_dimension: usize,
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk_metadata: ChunkMetadata,
    pub similarity_score: f32,
    pub distance: f32,
}

impl VectorStore {
    /// Create an empty store at `path` holding vectors of `vector_dimension`
    /// components. Fails if the store already has a rules table.
    #[inline]
    pub async fn create(path: &Path, vector_dimension: usize) -> Result<Self> {
        if vector_dimension == 0 {
            return Err(RagError::Database(
                "Vector dimension must be greater than zero".to_string(),
            ));
        }

        std::fs::create_dir_all(path).map_err(|e| {
            RagError::Database(format!("Failed to create vector database directory: {}", e))
        })?;

        let connection = Self::connect(path).await?;
        connection
            .create_empty_table(TABLE_NAME, create_schema(vector_dimension)?)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to create table: {}", e)))?;

        info!(
            "Created vector store at {} with {} dimensions",
            path.display(),
            vector_dimension
        );

        Ok(Self {
            connection,
            path: path.to_path_buf(),
            vector_dimension,
        })
    }

    /// Open an existing store and detect its vector dimension
    #[inline]
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(RagError::IndexMissing(path.to_path_buf()));
        }

        let connection = Self::connect(path).await?;

        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to list tables: {}", e)))?;

        if !table_names.iter().any(|name| name == TABLE_NAME) {
            return Err(RagError::IndexCorrupt {
                path: path.to_path_buf(),
                reason: format!("table '{}' is missing", TABLE_NAME),
            });
        }

        let mut store = Self {
            connection,
            path: path.to_path_buf(),
            vector_dimension: 0,
        };
        store.vector_dimension = store.detect_vector_dimension().await?;
        debug!(
            "Opened vector store at {} ({} dimensions)",
            path.display(),
            store.vector_dimension
        );

        Ok(store)
    }

    async fn connect(path: &Path) -> Result<Connection> {
        let uri = path.to_string_lossy();
        debug!("Connecting to LanceDB at {}", uri);

        lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to connect to LanceDB: {}", e)))
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn vector_dimension(&self) -> usize {
        self.vector_dimension
    }

    async fn table(&self) -> Result<Table> {
        self.connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to open table: {}", e)))
    }

    /// Read the vector dimension from the table schema
    async fn detect_vector_dimension(&self) -> Result<usize> {
        let schema = self
            .table()
            .await?
            .schema()
            .await
            .map_err(|e| RagError::Database(format!("Failed to get table schema: {}", e)))?;

        let dimension = schema
            .fields()
            .iter()
            .find(|field| field.name() == "vector")
            .and_then(|field| match field.data_type() {
                DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
                _ => None,
            });

        dimension.ok_or_else(|| RagError::IndexCorrupt {
            path: self.path.clone(),
            reason: "could not determine vector dimension".to_string(),
        })
    }

    /// Append chunk records to the store
    #[inline]
    pub async fn add_chunks(&self, records: &[ChunkRecord]) -> Result<()> {
        if records.is_empty() {
            debug!("No chunks to store");
            return Ok(());
        }

        if let Some(record) = records
            .iter()
            .find(|record| record.vector.len() != self.vector_dimension)
        {
            return Err(RagError::Database(format!(
                "Vector for {} has {} dimensions, store expects {}",
                record.metadata.source,
                record.vector.len(),
                self.vector_dimension
            )));
        }

        debug!("Storing batch of {} chunks", records.len());

        let record_batch = self.create_record_batch(records)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        self.table()
            .await?
            .add(reader)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to insert chunks: {}", e)))?;

        debug!("Stored {} chunks", records.len());
        Ok(())
    }

    fn create_record_batch(&self, records: &[ChunkRecord]) -> Result<RecordBatch> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * self.vector_dimension);
        let mut sources = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            sources.push(record.metadata.source.as_str());
            contents.push(record.metadata.content.as_str());
            chunk_indices.push(record.metadata.chunk_index);
            created_ats.push(record.metadata.created_at.as_str());
        }

        let vector_array = FixedSizeListArray::try_new(
            item_field(),
            list_size(self.vector_dimension)?,
            Arc::new(Float32Array::from(flat_values)),
            None,
        )
        .map_err(|e| RagError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(contents)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(create_schema(self.vector_dimension)?, arrays)
            .map_err(|e| RagError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Return the `limit` chunks closest to `query_vector` by cosine
    /// distance, nearest first.
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if query_vector.len() != self.vector_dimension {
            return Err(RagError::Database(format!(
                "Query vector has {} dimensions, store expects {}",
                query_vector.len(),
                self.vector_dimension
            )));
        }

        debug!("Searching for similar vectors with limit: {}", limit);

        let mut results = self
            .table()
            .await?
            .vector_search(query_vector)
            .map_err(|e| RagError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to execute search: {}", e)))?;

        let mut search_results = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read result stream: {}", e)))?
        {
            search_results.extend(parse_search_batch(&batch)?);
        }

        debug!("Found {} similar chunks", search_results.len());
        Ok(search_results)
    }

    /// Get the total number of chunks stored
    #[inline]
    pub async fn count_chunks(&self) -> Result<u64> {
        let count = self
            .table()
            .await?
            .count_rows(None)
            .await
            .map_err(|e| RagError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }
}

#[async_trait]
impl VectorIndex for VectorStore {
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_similar(query_vector, limit).await
    }
}

fn item_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, false))
}

fn list_size(vector_dimension: usize) -> Result<i32> {
    i32::try_from(vector_dimension).map_err(|_| {
        RagError::Database(format!(
            "Vector dimension {} is too large",
            vector_dimension
        ))
    })
}

fn create_schema(vector_dimension: usize) -> Result<Arc<Schema>> {
    Ok(Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(item_field(), list_size(vector_dimension)?),
            false,
        ),
        Field::new("source", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("created_at", DataType::Utf8, false),
    ])))
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| RagError::Database(format!("Invalid {} column type", name)))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>> {
    let sources = column::<StringArray>(batch, "source")?;
    let contents = column::<StringArray>(batch, "content")?;
    let chunk_indices = column::<UInt32Array>(batch, "chunk_index")?;
    let created_ats = column::<StringArray>(batch, "created_at")?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

    let results = (0..batch.num_rows())
        .map(|row| {
            let distance = distances
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

            SearchResult {
                chunk_metadata: ChunkMetadata {
                    source: sources.value(row).to_string(),
                    content: contents.value(row).to_string(),
                    chunk_index: chunk_indices.value(row),
                    created_at: created_ats.value(row).to_string(),
                },
                similarity_score: 1.0 - distance,
                distance,
            }
        })
        .collect();

    Ok(results)
}
