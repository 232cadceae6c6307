//! Building and reusing the vector index.


use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::chain::Retriever;
use crate::database::lancedb::{ChunkMetadata, EmbeddingRecord, VectorStore};
use crate::embeddings::chunking::{ChunkingConfig, chunk_documents};
use crate::embeddings::openai::EmbeddingClient;
use crate::loaders::Document;

/// How an [`IndexHandle`] came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    /// Opened from a persisted directory without loading any documents
    Reused,
    /// Built from freshly loaded documents
    Built,
}

/// A ready-to-query index
#[derive(Debug)]
pub struct IndexHandle {
    store: VectorStore,
    embeddings: EmbeddingClient,
    origin: IndexOrigin,
    // Keeps a non-persisted index alive until the handle drops
    _scratch_dir: Option<TempDir>,
}

impl IndexHandle {
    #[inline]
    pub fn origin(&self) -> IndexOrigin {
        self.origin
    }

    #[inline]
    pub fn vector_store(&self) -> &VectorStore {
        &self.store
    }

    #[inline]
    pub fn embeddings(&self) -> &EmbeddingClient {
        &self.embeddings
    }

    #[inline]
    pub fn as_retriever(&self, k: usize) -> Retriever<'_> {
        Retriever::new(self, k)
    }
}

#[derive(Debug, Clone)]
pub struct IndexBuilder {
    embeddings: EmbeddingClient,
    chunking: ChunkingConfig,
    persist_dir: PathBuf,
}

impl IndexBuilder {
    #[inline]
    pub fn new(
        embeddings: EmbeddingClient,
        chunking: ChunkingConfig,
        persist_dir: PathBuf,
    ) -> Self {
        Self {
            embeddings,
            chunking,
            persist_dir,
        }
    }

    #[inline]
    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    /// Reuse the persisted index when asked to and it exists, otherwise build one.
    ///
    /// `load` is only invoked for a fresh build.
    pub async fn get_index<F, Fut>(&self, persist: bool, load: F) -> Result<IndexHandle>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Document>>>,
    {
        if persist && self.persist_dir.exists() {
            info!("Reusing index at {}", self.persist_dir.display());
            let store = VectorStore::open(&self.persist_dir)
                .await
                .context("Failed to open persisted index")?;
            if store.vector_dimension().is_none() {
                warn!(
                    "Persisted index at {} holds no embeddings; delete it to rebuild",
                    self.persist_dir.display()
                );
            }

            return Ok(self.handle(store, IndexOrigin::Reused, None));
        }

        let documents = load().await?;

        let scratch = if persist {
            self.staging_dir()?
        } else {
            TempDir::new().context("Failed to create scratch index directory")?
        };
        let mut store = VectorStore::open(scratch.path())
            .await
            .context("Failed to create index store")?;
        let stored = self.build(&mut store, &documents).await?;

        if !persist || stored == 0 {
            if persist {
                warn!("Nothing to persist, the index lives only for this run");
            }
            return Ok(self.handle(store, IndexOrigin::Built, Some(scratch)));
        }

        // Only a complete index is moved into the persist directory
        drop(store);
        std::fs::rename(scratch.path(), &self.persist_dir).with_context(|| {
            format!("Failed to move index into {}", self.persist_dir.display())
        })?;
        info!("Persisted index at {}", self.persist_dir.display());

        let store = VectorStore::open(&self.persist_dir)
            .await
            .context("Failed to open persisted index")?;
        Ok(self.handle(store, IndexOrigin::Built, None))
    }

    fn handle(
        &self,
        store: VectorStore,
        origin: IndexOrigin,
        scratch_dir: Option<TempDir>,
    ) -> IndexHandle {
        IndexHandle {
            store,
            embeddings: self.embeddings.clone(),
            origin,
            _scratch_dir: scratch_dir,
        }
    }

    /// Temporary directory beside the persist directory, so the finished
    /// index can be renamed into place
    fn staging_dir(&self) -> Result<TempDir> {
        let parent = match self.persist_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        tempfile::Builder::new()
            .prefix(".seek-index-")
            .tempdir_in(parent)
            .context("Failed to create index staging directory")
    }

    /// Chunk, embed and store `documents`, returning the number of chunks stored
    async fn build(&self, store: &mut VectorStore, documents: &[Document]) -> Result<usize> {
        let chunks = chunk_documents(documents, &self.chunking);
        info!(
            "Indexing {} chunks from {} documents",
            chunks.len(),
            documents.len()
        );

        if chunks.is_empty() {
            warn!("No content to index");
            return Ok(0);
        }

        let batch_size = self.embeddings.batch_size() as usize;
        for batch in chunks.chunks(batch_size) {
            let embedding_results = self
                .embeddings
                .generate_chunk_embeddings(batch)
                .context("Failed to generate embeddings")?;

            let created_at = Utc::now().to_rfc3339();
            let records = batch
                .iter()
                .zip(embedding_results)
                .map(|(chunk, embedding_result)| {
                    let metadata = ChunkMetadata::from_chunk(chunk, &created_at)
                        .context("Failed to serialize document metadata")?;
                    Ok(EmbeddingRecord::new(embedding_result.embedding, metadata))
                })
                .collect::<Result<Vec<_>>>()?;

            store
                .store_embeddings_batch(records)
                .await
                .context("Failed to store embeddings")?;
            debug!("Stored batch of {} chunks", batch.len());
        }

        Ok(chunks.len())
    }
}
