use std::path::PathBuf;

use thiserror::Error;

use crate::embeddings::EmbeddingError;
use crate::extraction::ExtractionError;
use crate::llm_client::LlmError;
use crate::rag::retriever::RetrievalError;

/// Failures reading or writing the persisted vector store file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read vector store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write vector store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to lock vector store {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("vector store {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("vector store {path} has schema version {found}, expected {expected}")]
    UnsupportedSchema {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("failed to serialize vector store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Anything that stops a (re)build of the vector store.
#[derive(Debug, Error)]
pub enum RetrievalBuildError {
    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("chunk embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("persisting the vector store failed: {0}")]
    Persist(#[from] StoreError),
}

#[derive(Debug, Error)]
#[error("answer generation failed: {0}")]
pub struct SynthesisError(#[from] pub LlmError);

/// The one error `answer_query` can fail with. Lets callers tell
/// "could not build the index" apart from "could not answer".
#[derive(Debug, Error)]
pub enum RagError {
    #[error("could not build the resume index: {0}")]
    RetrievalBuild(#[from] RetrievalBuildError),

    #[error("could not load the resume index: {0}")]
    Store(#[from] StoreError),

    #[error("could not embed the query: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("could not rank resume chunks: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("could not answer: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("operation cancelled")]
    Cancelled,
}
