//! Embedding service — maps chunk and query text to fixed-length vectors.
//!
//! `EmbeddingProvider` is the seam the RAG pipeline depends on; `OpenAiEmbedder`
//! is the production backend. Calls are never retried here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Inputs accepted by a single OpenAI embeddings request.
pub const MAX_BATCH_SIZE: usize = 2048;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every text, returning one vector per input in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Malformed("no vector returned for query".to_string()))
    }

    /// Model identifier, persisted with the store.
    fn model(&self) -> &str;
}

/// Checks that `vectors` holds one non-empty vector per input and that all
/// share a dimension. Returns that dimension (0 for an empty batch).
pub fn validate_batch(expected_len: usize, vectors: &[Vec<f32>]) -> Result<usize, EmbeddingError> {
    if vectors.len() != expected_len {
        return Err(EmbeddingError::Malformed(format!(
            "expected {expected_len} vectors, got {}",
            vectors.len()
        )));
    }
    let Some(first) = vectors.first() else {
        return Ok(0);
    };
    let dimension = first.len();
    if dimension == 0 {
        return Err(EmbeddingError::Malformed("zero-length embedding".to_string()));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(EmbeddingError::DimensionMismatch {
            expected: dimension,
            actual: bad.len(),
        });
    }
    Ok(dimension)
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingUsage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

impl EmbeddingResponse {
    /// Orders the returned vectors by their `index` field.
    fn into_vectors(self, expected_len: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected_len];
        for item in self.data {
            let slot = slots.get_mut(item.index).ok_or_else(|| {
                EmbeddingError::Malformed(format!("embedding index {} out of range", item.index))
            })?;
            if slot.replace(item.embedding).is_some() {
                return Err(EmbeddingError::Malformed(format!(
                    "duplicate embedding index {}",
                    item.index
                )));
            }
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or_else(|| EmbeddingError::Malformed(format!("missing embedding for input {i}")))
            })
            .collect()
    }
}

/// OpenAI `/embeddings` backend. Batches inputs up to `MAX_BATCH_SIZE` per request.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(client: Client, api_key: String, base_url: &str, model: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;
        if let Some(usage) = &parsed.usage {
            debug!("Embedded {} inputs ({} tokens)", input.len(), usage.total_tokens);
        }
        parsed.into_vectors(input.len())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH_SIZE) {
            vectors.extend(self.request(batch).await?);
        }
        validate_batch(texts.len(), &vectors)?;
        Ok(vectors)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
