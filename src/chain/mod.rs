//! Retrieval-augmented question answering.


use anyhow::{Context, Result};
use async_trait::async_trait;
use itertools::Itertools;
use tracing::debug;

use crate::database::lancedb::SearchResult;
use crate::index::IndexHandle;
use crate::llm::{ChatClient, ChatMessage};

const SYSTEM_PROMPT_PREFIX: &str = "Use the following pieces of context to answer the user's question. \nIf you don't know the answer, just say that you don't know, don't try to make up an answer.\n----------------\n";

/// Anything that turns a question into an answer
#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn answer(&self, query: &str) -> Result<String>;
}

/// Top-k similarity search over an index
#[derive(Debug, Clone, Copy)]
pub struct Retriever<'a> {
    index: &'a IndexHandle,
    k: usize,
}

impl<'a> Retriever<'a> {
    #[inline]
    pub fn new(index: &'a IndexHandle, k: usize) -> Self {
        Self { index, k }
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self
            .index
            .embeddings()
            .generate_embedding(query)
            .context("Failed to embed query")?;

        let results = self
            .index
            .vector_store()
            .search_similar(&query_embedding.embedding, self.k)
            .await
            .context("Similarity search failed")?;

        debug!("Retrieved {} chunks for query", results.len());
        Ok(results)
    }
}

/// The system message carrying retrieved context, then the user's query
pub fn build_messages<S: AsRef<str>>(query: &str, contexts: &[S]) -> Vec<ChatMessage> {
    let context = contexts.iter().map(AsRef::as_ref).join("\n\n");

    vec![
        ChatMessage::system(format!("{SYSTEM_PROMPT_PREFIX}{context}")),
        ChatMessage::user(query),
    ]
}

#[derive(Debug, Clone)]
pub struct RetrievalChain<'a> {
    retriever: Retriever<'a>,
    chat: ChatClient,
}

impl<'a> RetrievalChain<'a> {
    #[inline]
    pub fn new(retriever: Retriever<'a>, chat: ChatClient) -> Self {
        Self { retriever, chat }
    }

    /// Retrieve context for `query` and ask the chat model
    pub async fn run(&self, query: &str) -> Result<String> {
        let results = self.retriever.retrieve(query).await?;
        let contexts: Vec<&str> = results
            .iter()
            .map(|r| r.chunk_metadata.content.as_str())
            .collect();

        let messages = build_messages(query, &contexts);
        self.chat.complete(&messages)
    }
}

#[async_trait]
impl QueryEngine for RetrievalChain<'_> {
    async fn answer(&self, query: &str) -> Result<String> {
        self.run(query).await
    }
}
