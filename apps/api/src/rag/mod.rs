// Resume question answering: extract → chunk → embed → store → retrieve → synthesize.
// External services are injected as trait objects; nothing here is retried.

pub mod cancel;
pub mod chunker;
pub mod error;
pub mod handlers;
pub mod prompts;
pub mod retriever;
pub mod store;
pub mod synthesis;

#[cfg(test)]
pub mod test_support;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::embeddings::EmbeddingProvider;
use crate::extraction::{DigestCache, TextExtractor};
use crate::llm_client::GenerationProvider;
use crate::rag::cancel::CallGuard;
use crate::rag::chunker::ChunkParams;
use crate::rag::error::RagError;
use crate::rag::store::{StoreBuilder, VectorStore};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Inputs of one `answer_query` call.
pub struct QueryParams<'a> {
    pub query: &'a str,
    pub document: &'a Path,
    pub storage_path: &'a Path,
    pub force_rebuild: bool,
    /// Overrides the service's default k.
    pub top_k: Option<usize>,
}

/// The retrieval-augmented answering service.
pub struct ResumeQa {
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn GenerationProvider>,
    chunk_params: ChunkParams,
    top_k: usize,
    call_timeout: Duration,
    rebuild_if_stale: bool,
    digests: DigestCache,
}

impl ResumeQa {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            extractor,
            embedder,
            llm,
            chunk_params: ChunkParams::default(),
            top_k: DEFAULT_TOP_K,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            rebuild_if_stale: false,
            digests: DigestCache::default(),
        }
    }

    pub fn with_chunk_params(mut self, chunk_params: ChunkParams) -> Self {
        self.chunk_params = chunk_params;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_rebuild_if_stale(mut self, rebuild_if_stale: bool) -> Self {
        self.rebuild_if_stale = rebuild_if_stale;
        self
    }

    fn store_builder<'a>(&'a self, guard: &'a CallGuard) -> StoreBuilder<'a> {
        StoreBuilder {
            extractor: self.extractor.as_ref(),
            embedder: self.embedder.as_ref(),
            chunk_params: self.chunk_params,
            rebuild_if_stale: self.rebuild_if_stale,
            digests: &self.digests,
            guard,
        }
    }

    /// Loads the vector store at `storage_path`, building it from `document`
    /// when missing or when `force_rebuild` is set.
    pub async fn obtain_store(
        &self,
        document: &Path,
        storage_path: &Path,
        force_rebuild: bool,
        cancel: &CancellationToken,
    ) -> Result<VectorStore, RagError> {
        let guard = CallGuard::new(cancel.clone(), self.call_timeout);
        self.store_builder(&guard)
            .obtain(document, storage_path, force_rebuild)
            .await
    }

    /// Swaps in a new resume. The document at `document` is only replaced
    /// once a store built from `bytes` is ready to be written with it.
    pub async fn replace_document(
        &self,
        document: &Path,
        storage_path: &Path,
        bytes: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<VectorStore, RagError> {
        let guard = CallGuard::new(cancel.clone(), self.call_timeout);
        self.store_builder(&guard)
            .replace_document(document, storage_path, bytes)
            .await
    }

    /// Answers one question about the resume. Returns the generated answer or
    /// exactly one typed error; never a partial answer.
    pub async fn answer_query(
        &self,
        params: QueryParams<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, RagError> {
        let QueryParams {
            query,
            document,
            storage_path,
            force_rebuild,
            top_k,
        } = params;
        let guard = CallGuard::new(cancel.clone(), self.call_timeout);

        // Step 1: build or load the index
        let store = self
            .obtain_store(document, storage_path, force_rebuild, cancel)
            .await?;

        // Step 2: embed the query
        let query_vector = guard.run(self.embedder.embed(query)).await??;

        // Step 3: rank chunks
        let k = top_k.unwrap_or(self.top_k);
        let hits = retriever::retrieve(&query_vector, &store, k)?;
        info!(
            "Retrieved {} of {} chunks (best score {:.3})",
            hits.len(),
            store.len(),
            hits.first().map(|h| h.score).unwrap_or(0.0)
        );
        let chunks: Vec<&str> = hits
            .iter()
            .filter_map(|hit| store.chunk(hit.index))
            .collect();

        // Step 4: synthesize
        let answer = guard
            .run(synthesis::answer(query, &chunks, self.llm.as_ref()))
            .await??;
        Ok(answer)
    }
}
