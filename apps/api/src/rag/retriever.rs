//! Retriever — ranks stored chunks against a query vector by cosine similarity.

use serde::Serialize;
use thiserror::Error;

use crate::rag::store::VectorStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("query vector has dimension {query}, stored vectors have {store}")]
    DimensionMismatch { query: usize, store: usize },
}

/// A stored chunk index with its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub index: usize,
    pub score: f32,
}

/// `dot(a, b) / (|a| * |b|)` in f32. A zero-norm (or otherwise degenerate)
/// vector scores 0.0 instead of producing NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    let similarity = dot / denominator;
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Returns up to `k` chunks ranked by descending similarity. Equal scores keep
/// storage order. An empty store yields an empty result.
pub fn retrieve(
    query: &[f32],
    store: &VectorStore,
    k: usize,
) -> Result<Vec<ScoredChunk>, RetrievalError> {
    if store.is_empty() || k == 0 {
        return Ok(Vec::new());
    }
    if query.len() != store.dimension() {
        return Err(RetrievalError::DimensionMismatch {
            query: query.len(),
            store: store.dimension(),
        });
    }

    let mut scored: Vec<ScoredChunk> = store
        .vectors()
        .iter()
        .enumerate()
        .map(|(index, vector)| ScoredChunk {
            index,
            score: cosine_similarity(query, vector),
        })
        .collect();

    // sort_by is stable, so ties stay in storage order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    Ok(scored)
}
