// Embeddings module
// Document chunking and the hosted embeddings endpoint

pub mod chunking;
pub mod openai;

pub use chunking::{
    ChunkingConfig, ContentChunk, chunk_document, chunk_documents, estimate_token_count,
};
pub use openai::{EmbeddingClient, EmbeddingResult};
