
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OpenAiConfig;
use crate::embeddings::chunking::{ContentChunk, estimate_token_count};
use crate::openai::ApiClient;

const EMBEDDINGS_PATH: &str = "embeddings";

#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    api: ApiClient,
    model: String,
    batch_size: u32,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingResult {
    pub text: String,
    pub embedding: Vec<f32>,
    pub token_count: usize,
    pub chunk_index: Option<usize>,
    pub source: Option<String>,
}

impl EmbeddingClient {
    #[inline]
    pub fn new(api: ApiClient, config: &OpenAiConfig) -> Self {
        Self {
            api,
            model: config.embedding_model.clone(),
            batch_size: config.batch_size.max(1),
        }
    }

    #[inline]
    pub fn from_config(config: &OpenAiConfig, api_key: &str) -> Result<Self> {
        let api = ApiClient::new(config, api_key)?;
        Ok(Self::new(api, config))
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[inline]
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Embed a single text, typically a user query
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<EmbeddingResult> {
        debug!("Generating embedding for text (length: {})", text.len());

        let mut results = self.generate_embeddings_single_batch(&[text.to_string()])?;
        results
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding response was empty"))
    }

    /// Embed many texts, `batch_size` inputs per request
    #[inline]
    pub fn generate_embeddings_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResult>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size as usize) {
            let batch_results = self
                .generate_embeddings_single_batch(chunk)
                .with_context(|| format!("Failed to process batch of {} texts", chunk.len()))?;

            results.extend(batch_results);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }

    #[inline]
    pub fn generate_chunk_embeddings(
        &self,
        chunks: &[ContentChunk],
    ) -> Result<Vec<EmbeddingResult>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} content chunks", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let mut results = self.generate_embeddings_batch(&texts)?;

        for (result, chunk) in results.iter_mut().zip(chunks.iter()) {
            result.chunk_index = Some(chunk.chunk_index);
            result.source = Some(chunk.source.clone());
            result.token_count = chunk.token_count;
        }

        Ok(results)
    }

    fn generate_embeddings_single_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingResult>> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let mut response: EmbedResponse = self
            .api
            .post_json(EMBEDDINGS_PATH, &request)
            .context("Failed to generate embeddings")?;

        if response.data.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.data.len()
            ));
        }

        // Entries may arrive out of order
        response.data.sort_by_key(|entry| entry.index);

        let results = texts
            .iter()
            .zip(response.data)
            .map(|(text, entry)| EmbeddingResult {
                text: text.clone(),
                embedding: entry.embedding,
                token_count: estimate_token_count(text),
                chunk_index: None,
                source: None,
            })
            .collect();

        Ok(results)
    }
}
