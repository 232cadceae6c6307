//! LanceDB-backed storage for chunk embeddings.


pub mod vector_store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embeddings::chunking::ContentChunk;

pub use vector_store::{SearchResult, VectorStore};

/// One row of the index table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: String,
    /// Every record in a table shares one dimension
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

impl EmbeddingRecord {
    /// A record with a fresh random id
    #[inline]
    pub fn new(vector: Vec<f32>, metadata: ChunkMetadata) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vector,
            metadata,
        }
    }
}

/// Chunk fields stored next to the vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// File path of the source document, or `conversations`
    pub source: String,
    pub content: String,
    pub chunk_index: u32,
    pub token_count: u32,
    /// Parent document metadata as a JSON object
    pub metadata_json: String,
    /// RFC 3339
    pub created_at: String,
}

impl ChunkMetadata {
    #[inline]
    pub fn from_chunk(chunk: &ContentChunk, created_at: &str) -> serde_json::Result<Self> {
        Ok(Self {
            source: chunk.source.clone(),
            content: chunk.content.clone(),
            chunk_index: u32::try_from(chunk.chunk_index).unwrap_or(u32::MAX),
            token_count: u32::try_from(chunk.token_count).unwrap_or(u32::MAX),
            metadata_json: serde_json::to_string(&chunk.metadata)?,
            created_at: created_at.to_string(),
        })
    }

    /// The parent document's metadata, decoded from `metadata_json`
    #[inline]
    pub fn document_metadata(&self) -> serde_json::Result<BTreeMap<String, String>> {
        serde_json::from_str(&self.metadata_json)
    }
}
