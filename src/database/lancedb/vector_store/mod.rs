
use super::{ChunkMetadata, EmbeddingRecord};
use crate::SeekError;
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "embeddings";

/// Vector database store using LanceDB for similarity search
pub struct VectorStore {
    connection: Connection,
    path: PathBuf,
    table_name: String,
    vector_dimension: Option<usize>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("path", &self.path)
            .field("table_name", &self.table_name)
            .field("vector_dimension", &self.vector_dimension)
            .finish_non_exhaustive()
    }
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk_metadata: ChunkMetadata,
    pub similarity_score: f32,
    pub distance: f32,
}

impl VectorStore {
    /// Open (or create) the store rooted at `db_path`
    ///
    /// An existing `embeddings` table is reused as-is and its vector
    /// dimension is read from the schema. Otherwise the table is created on
    /// the first insert, once the dimension is known.
    #[inline]
    pub async fn open(db_path: &Path) -> Result<Self, SeekError> {
        debug!("Initializing LanceDB at path: {:?}", db_path);

        std::fs::create_dir_all(db_path).map_err(|e| {
            SeekError::Database(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = db_path.to_string_lossy();
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| SeekError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        let mut store = Self {
            connection,
            path: db_path.to_path_buf(),
            table_name: TABLE_NAME.to_string(),
            vector_dimension: None,
        };

        if store.table_exists().await? {
            let dim = store.detect_existing_vector_dimension().await?;
            info!("Opened existing embeddings table ({} dimensions)", dim);
            store.vector_dimension = Some(dim);
        }

        Ok(store)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn vector_dimension(&self) -> Option<usize> {
        self.vector_dimension
    }

    async fn table_exists(&self) -> Result<bool, SeekError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| SeekError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.contains(&self.table_name))
    }

    /// Detect vector dimension from existing table schema
    async fn detect_existing_vector_dimension(&self) -> Result<usize, SeekError> {
        let table = self.open_table().await?;

        let schema = table
            .schema()
            .await
            .map_err(|e| SeekError::Database(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(SeekError::Database(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    async fn open_table(&self) -> Result<lancedb::Table, SeekError> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| SeekError::Database(format!("Failed to open table: {}", e)))
    }

    /// Create schema with the specified vector dimension
    fn create_schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("source", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("token_count", DataType::UInt32, false),
            Field::new("metadata_json", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Store multiple embeddings in a batch
    ///
    /// The first batch fixes the table's vector dimension; later batches
    /// with a different dimension are rejected.
    #[inline]
    pub async fn store_embeddings_batch(
        &mut self,
        records: Vec<EmbeddingRecord>,
    ) -> Result<(), SeekError> {
        if records.is_empty() {
            debug!("No embeddings to store");
            return Ok(());
        }

        debug!("Storing batch of {} embeddings", records.len());

        let vector_dim = records[0].vector.len();
        if let Some(record) = records.iter().find(|r| r.vector.len() != vector_dim) {
            return Err(SeekError::Database(format!(
                "Embedding {} has {} dimensions, expected {}",
                record.id,
                record.vector.len(),
                vector_dim
            )));
        }

        match self.vector_dimension {
            None => {
                info!("Creating embeddings table with {} dimensions", vector_dim);
                self.connection
                    .create_empty_table(&self.table_name, Self::create_schema(vector_dim))
                    .execute()
                    .await
                    .map_err(|e| SeekError::Database(format!("Failed to create table: {}", e)))?;
                self.vector_dimension = Some(vector_dim);
            }
            Some(existing) if existing != vector_dim => {
                return Err(SeekError::Database(format!(
                    "Vector dimension mismatch: table has {}, batch has {}",
                    existing, vector_dim
                )));
            }
            Some(_) => {}
        }

        let record_batch = Self::create_record_batch(&records, vector_dim)?;
        let table = self.open_table().await?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| SeekError::Database(format!("Failed to insert embeddings: {}", e)))?;

        debug!("Stored {} embeddings", records.len());
        Ok(())
    }

    /// Create a RecordBatch from embedding records
    fn create_record_batch(
        records: &[EmbeddingRecord],
        vector_dim: usize,
    ) -> Result<RecordBatch, SeekError> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut sources = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut token_counts = Vec::with_capacity(len);
        let mut metadata_jsons = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);

        for record in records {
            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            sources.push(record.metadata.source.as_str());
            contents.push(record.metadata.content.as_str());
            chunk_indices.push(record.metadata.chunk_index);
            token_counts.push(record.metadata.token_count);
            metadata_jsons.push(record.metadata.metadata_json.as_str());
            created_ats.push(record.metadata.created_at.as_str());
        }

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| {
                    SeekError::Database(format!("Failed to create vector array: {}", e))
                })?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(contents)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(UInt32Array::from(token_counts)),
            Arc::new(StringArray::from(metadata_jsons)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(Self::create_schema(vector_dim), arrays)
            .map_err(|e| SeekError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Return up to `limit` chunks nearest to `query_vector`, closest first
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, SeekError> {
        debug!("Searching for similar vectors with limit: {}", limit);

        if self.vector_dimension.is_none() || limit == 0 {
            return Ok(Vec::new());
        }

        let table = self.open_table().await?;

        let results = table
            .vector_search(query_vector)
            .map_err(|e| SeekError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| SeekError::Database(format!("Failed to execute search: {}", e)))?;

        let mut search_results = Self::parse_search_results_stream(results).await?;
        search_results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(search_results)
    }

    async fn parse_search_results_stream(
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<SearchResult>, SeekError> {
        let mut search_results = Vec::new();

        while let Some(batch_result) = results
            .try_next()
            .await
            .map_err(|e| SeekError::Database(format!("Failed to read result stream: {}", e)))?
        {
            search_results.extend(Self::parse_search_batch(&batch_result)?);
        }

        debug!("Parsed {} search results from stream", search_results.len());
        Ok(search_results)
    }

    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, SeekError> {
        let sources = string_column(batch, "source")?;
        let contents = string_column(batch, "content")?;
        let metadata_jsons = string_column(batch, "metadata_json")?;
        let created_ats = string_column(batch, "created_at")?;
        let chunk_indices = u32_column(batch, "chunk_index")?;
        let token_counts = u32_column(batch, "token_count")?;

        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        let search_results = (0..batch.num_rows())
            .map(|row| {
                let distance =
                    distances.map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

                SearchResult {
                    chunk_metadata: ChunkMetadata {
                        source: sources.value(row).to_string(),
                        content: contents.value(row).to_string(),
                        chunk_index: chunk_indices.value(row),
                        token_count: token_counts.value(row),
                        metadata_json: metadata_jsons.value(row).to_string(),
                        created_at: created_ats.value(row).to_string(),
                    },
                    // Map distance into (0, 1], higher is closer
                    similarity_score: 1.0 / (1.0 + distance.max(0.0)),
                    distance,
                }
            })
            .collect();

        Ok(search_results)
    }

    /// Get the total number of embeddings stored
    #[inline]
    pub async fn count_embeddings(&self) -> Result<u64, SeekError> {
        if self.vector_dimension.is_none() {
            return Ok(0);
        }

        let table = self.open_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| SeekError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, SeekError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SeekError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| SeekError::Database(format!("Invalid {} column type", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array, SeekError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SeekError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| SeekError::Database(format!("Invalid {} column type", name)))
}
