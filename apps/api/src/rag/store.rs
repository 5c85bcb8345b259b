//! Vector Store — the persisted pairing of resume chunks and their embeddings.
//!
//! Lifecycle: built once from a document (full rebuild), then loaded as-is until
//! a rebuild is requested. There are no incremental updates.
//!
//! Concurrency: rebuilds take an exclusive advisory lock on `<store>.lock` and
//! write through a temp file in the same directory that is renamed over the
//! target. Readers never lock; they see either the old file or the new one.
//! Replacing the document itself happens under the same lock, and the new
//! document only lands on disk together with a store built from it.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embeddings::{validate_batch, EmbeddingError, EmbeddingProvider};
use crate::extraction::{DigestCache, Document, TextExtractor};
use crate::rag::cancel::CallGuard;
use crate::rag::chunker::{chunk_text, ChunkParams};
use crate::rag::error::{RagError, RetrievalBuildError, StoreError};

pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Chunks and their embedding matrix, aligned by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStore {
    schema_version: u32,
    embedding_model: String,
    dimension: usize,
    source_sha256: String,
    built_at: DateTime<Utc>,
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl VectorStore {
    /// Pairs chunks with vectors. Fails unless there is exactly one vector per
    /// chunk and all vectors share one dimension.
    pub fn new(
        chunks: Vec<String>,
        vectors: Vec<Vec<f32>>,
        embedding_model: &str,
        source_sha256: &str,
    ) -> Result<Self, EmbeddingError> {
        let dimension = validate_batch(chunks.len(), &vectors)?;
        Ok(Self {
            schema_version: STORE_SCHEMA_VERSION,
            embedding_model: embedding_model.to_string(),
            dimension,
            source_sha256: source_sha256.to_string(),
            built_at: Utc::now(),
            chunks,
            vectors,
        })
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn chunk(&self, index: usize) -> Option<&str> {
        self.chunks.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// True when the store was built from different document bytes.
    pub fn is_stale_for(&self, document_sha256: &str) -> bool {
        self.source_sha256 != document_sha256
    }

    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let store: VectorStore =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if store.schema_version != STORE_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                path: path.to_path_buf(),
                found: store.schema_version,
                expected: STORE_SCHEMA_VERSION,
            });
        }
        let dimension = validate_batch(store.chunks.len(), &store.vectors).map_err(|e| {
            StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        if dimension != store.dimension {
            return Err(StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: format!(
                    "header says dimension {}, vectors have {dimension}",
                    store.dimension
                ),
            });
        }
        Ok(store)
    }

    /// Writes the store to `path` atomically: serialize into a temp file next to
    /// the target, fsync, then rename over it. A failure leaves any previous
    /// file untouched and removes the temp file.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(self)?;
        let target = path.to_path_buf();

        tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
            .await
            .map_err(|e| StoreError::Write {
                path: path.to_path_buf(),
                source: std::io::Error::other(e),
            })?
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    stage(path, bytes)?.commit()
}

/// A fully written, synced temp file waiting to be renamed over `target`.
/// Dropping it without committing deletes the temp file.
struct Staged {
    target: PathBuf,
    file: tempfile::NamedTempFile,
}

impl Staged {
    fn commit(self) -> Result<(), StoreError> {
        let Staged { target, file } = self;
        file.persist(&target).map_err(|e| StoreError::Write {
            path: target.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

fn stage(path: &Path, bytes: &[u8]) -> Result<Staged, StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;
    Ok(Staged {
        target: path.to_path_buf(),
        file,
    })
}

/// Stages both files before renaming either, so a failed write leaves the
/// previous document and store in place.
async fn commit_document_and_store(
    document: &Path,
    document_bytes: Vec<u8>,
    storage_path: &Path,
    store_bytes: Vec<u8>,
) -> Result<(), StoreError> {
    let (document, storage) = (document.to_path_buf(), storage_path.to_path_buf());
    tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
        let staged_document = stage(&document, &document_bytes)?;
        let staged_store = stage(&storage, &store_bytes)?;
        staged_document.commit()?;
        staged_store.commit()
    })
    .await
    .map_err(|e| StoreError::Write {
        path: storage_path.to_path_buf(),
        source: std::io::Error::other(e),
    })?
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub fn lock_path_for(storage_path: &Path) -> PathBuf {
    let mut name = OsString::from(storage_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Exclusive advisory lock held for the duration of a rebuild.
pub struct RebuildLock {
    file: std::fs::File,
}

impl Drop for RebuildLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

pub async fn acquire_rebuild_lock(storage_path: &Path) -> Result<RebuildLock, StoreError> {
    let path = lock_path_for(storage_path);
    let dir = parent_dir(&path);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|source| StoreError::Lock {
            path: path.clone(),
            source,
        })?;

    tokio::task::spawn_blocking(move || -> Result<RebuildLock, StoreError> {
        let lock_err = |source| StoreError::Lock {
            path: path.clone(),
            source,
        };
        let file = std::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;
        Ok(RebuildLock { file })
    })
    .await
    .map_err(|e| StoreError::Lock {
        path: lock_path_for(storage_path),
        source: std::io::Error::other(e),
    })?
}

/// Collaborators and settings needed to build or load a store.
pub struct StoreBuilder<'a> {
    pub extractor: &'a dyn TextExtractor,
    pub embedder: &'a dyn EmbeddingProvider,
    pub chunk_params: ChunkParams,
    pub rebuild_if_stale: bool,
    pub digests: &'a DigestCache,
    pub guard: &'a CallGuard,
}

impl StoreBuilder<'_> {
    /// Loads the store at `storage_path`, or builds it from `document` when the
    /// file is missing or `force_rebuild` is set.
    pub async fn obtain(
        &self,
        document: &Path,
        storage_path: &Path,
        force_rebuild: bool,
    ) -> Result<VectorStore, RagError> {
        if !force_rebuild {
            if let Some(store) = self.load_existing(document, storage_path).await? {
                return Ok(store);
            }
        }

        let _lock = self
            .guard
            .run(acquire_rebuild_lock(storage_path))
            .await?
            .map_err(RetrievalBuildError::from)?;

        // A concurrent builder may have finished while we waited for the lock.
        if !force_rebuild {
            if let Some(store) = self.load_existing(document, storage_path).await? {
                debug!("Store at {} appeared while waiting for lock", storage_path.display());
                return Ok(store);
            }
        }

        let document = Document::read(document)
            .await
            .map_err(RetrievalBuildError::from)?;
        let store = self.build(&document).await?;
        self.guard.check()?;
        store
            .save(storage_path)
            .await
            .map_err(RetrievalBuildError::from)?;
        info!(
            "Saved vector store to {} ({} chunks, dim {})",
            storage_path.display(),
            store.len(),
            store.dimension()
        );
        Ok(store)
    }

    /// Replaces `document` with `bytes` and rebuilds the store from them.
    /// Neither file changes unless the build succeeds.
    pub async fn replace_document(
        &self,
        document: &Path,
        storage_path: &Path,
        bytes: Vec<u8>,
    ) -> Result<VectorStore, RagError> {
        let _lock = self
            .guard
            .run(acquire_rebuild_lock(storage_path))
            .await?
            .map_err(RetrievalBuildError::from)?;

        let staged = Document {
            path: document.to_path_buf(),
            bytes,
        };
        let store = self.build(&staged).await?;
        self.guard.check()?;

        let store_bytes = serde_json::to_vec(&store)
            .map_err(StoreError::from)
            .map_err(RetrievalBuildError::from)?;
        commit_document_and_store(document, staged.bytes, storage_path, store_bytes)
            .await
            .map_err(RetrievalBuildError::from)?;
        info!(
            "Replaced {} and saved vector store to {} ({} chunks, dim {})",
            document.display(),
            storage_path.display(),
            store.len(),
            store.dimension()
        );
        Ok(store)
    }

    /// Returns the stored content unchanged if a usable file exists. A store
    /// built from different document bytes is still returned (with a warning)
    /// unless `rebuild_if_stale` is set.
    async fn load_existing(
        &self,
        document: &Path,
        storage_path: &Path,
    ) -> Result<Option<VectorStore>, RagError> {
        let exists = tokio::fs::try_exists(storage_path)
            .await
            .map_err(|source| StoreError::Read {
                path: storage_path.to_path_buf(),
                source,
            })?;
        if !exists {
            return Ok(None);
        }

        let store = VectorStore::load(storage_path).await?;
        info!(
            "Loaded vector store from {} ({} chunks, model {}, built {})",
            storage_path.display(),
            store.len(),
            store.embedding_model(),
            store.built_at().to_rfc3339()
        );

        match self.digests.sha256_of(document).await {
            Ok(digest) if store.is_stale_for(&digest) => {
                warn!(
                    "Vector store {} was built from a different version of {}",
                    storage_path.display(),
                    document.display()
                );
                if self.rebuild_if_stale {
                    return Ok(None);
                }
            }
            Ok(_) => {}
            Err(e) => debug!("Skipping staleness check for {}: {e}", document.display()),
        }
        Ok(Some(store))
    }

    async fn build(&self, document: &Document) -> Result<VectorStore, RagError> {
        info!(
            "Building vector store from {} ({} extractor)",
            document.path.display(),
            self.extractor.name()
        );
        let text = self
            .guard
            .run(self.extractor.extract(&document.bytes))
            .await?
            .map_err(RetrievalBuildError::from)?;

        let chunks: Vec<String> = chunk_text(&text, self.chunk_params)
            .into_iter()
            .map(|c| c.text)
            .collect();
        info!(
            "Split {} into {} chunks ({} chars, size {}, overlap {})",
            document.path.display(),
            chunks.len(),
            text.chars().count(),
            self.chunk_params.size(),
            self.chunk_params.overlap()
        );

        let vectors = self
            .guard
            .run(self.embedder.embed_batch(&chunks))
            .await?
            .map_err(RetrievalBuildError::from)?;

        let store = VectorStore::new(
            chunks,
            vectors,
            self.embedder.model(),
            &document.sha256(),
        )
        .map_err(RetrievalBuildError::from)?;
        Ok(store)
    }
}
