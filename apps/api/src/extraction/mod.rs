//! Text extraction — turns a resume document into a single text blob.
//!
//! PDFs go through `pdf-extract` on the blocking pool (it is CPU-bound and can
//! panic on malformed input). Plain-text resumes are passed through as UTF-8.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    #[error("document is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("no text could be extracted from the document")]
    Empty,
}

/// Raw bytes of a source document. Only lives for the duration of one build.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl Document {
    pub async fn read(path: &Path) -> Result<Self, ExtractionError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ExtractionError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    /// Hex SHA-256 of the document bytes, recorded in the vector store.
    pub fn sha256(&self) -> String {
        sha256_hex(&self.bytes)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Remembers document digests keyed by path, size and mtime, so an unchanged
/// document is hashed once rather than on every store load.
#[derive(Default)]
pub struct DigestCache {
    entries: Mutex<HashMap<PathBuf, CachedDigest>>,
    computed: AtomicUsize,
}

struct CachedDigest {
    len: u64,
    modified: SystemTime,
    sha256: String,
}

impl DigestCache {
    pub async fn sha256_of(&self, path: &Path) -> std::io::Result<String> {
        let meta = tokio::fs::metadata(path).await?;
        let modified = meta.modified().ok();

        if let Some(modified) = modified {
            let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = entries.get(path) {
                if hit.len == meta.len() && hit.modified == modified {
                    return Ok(hit.sha256.clone());
                }
            }
        }

        let bytes = tokio::fs::read(path).await?;
        let sha256 = sha256_hex(&bytes);
        self.computed.fetch_add(1, Ordering::Relaxed);
        debug!("Hashed {} ({} bytes)", path.display(), bytes.len());

        // no mtime on this platform: never trust a cached digest
        if let Some(modified) = modified {
            self.entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(
                    path.to_path_buf(),
                    CachedDigest {
                        len: bytes.len() as u64,
                        modified,
                        sha256: sha256.clone(),
                    },
                );
        }
        Ok(sha256)
    }

    /// Number of times a document was actually read and hashed.
    pub fn computed(&self) -> usize {
        self.computed.load(Ordering::Relaxed)
    }
}

/// Extraction service: document bytes in, text out.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;

    fn name(&self) -> &str;
}

pub struct PdfExtractor;

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let data = bytes.to_vec();
        let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            .map_err(|e| ExtractionError::Pdf(format!("extractor task aborted: {e}")))?
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

        let text = normalize_pdf_text(&raw);
        debug!("Extracted {} characters from PDF", text.chars().count());
        non_empty(text)
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ExtractionError::InvalidUtf8)?;
        non_empty(text.replace("\r\n", "\n"))
    }

    fn name(&self) -> &str {
        "plain-text"
    }
}

/// Dispatches on content: anything starting with the `%PDF-` magic goes to
/// `PdfExtractor`, everything else is read as plain text.
pub struct AutoExtractor;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[async_trait]
impl TextExtractor for AutoExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if bytes.starts_with(PDF_MAGIC) {
            PdfExtractor.extract(bytes).await
        } else {
            PlainTextExtractor.extract(bytes).await
        }
    }

    fn name(&self) -> &str {
        "auto"
    }
}

fn non_empty(text: String) -> Result<String, ExtractionError> {
    if text.trim().is_empty() {
        Err(ExtractionError::Empty)
    } else {
        Ok(text)
    }
}

/// Replaces typographic ligatures and odd whitespace that PDF fonts emit.
fn normalize_pdf_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_text_passthrough() {
        let text = PlainTextExtractor
            .extract(b"Jane Doe\r\nSenior Rust Engineer")
            .await
            .unwrap();
        assert_eq!(text, "Jane Doe\nSenior Rust Engineer");
    }

    #[tokio::test]
    async fn test_plain_text_rejects_invalid_utf8() {
        let err = PlainTextExtractor.extract(&[0xff, 0xfe, 0x00]).await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidUtf8));
    }

    #[tokio::test]
    async fn test_whitespace_only_is_empty() {
        let err = PlainTextExtractor.extract(b"  \n\t ").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Empty));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_extraction_error() {
        let err = PdfExtractor.extract(b"definitely not a pdf").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    #[tokio::test]
    async fn test_missing_document_is_io_error() {
        let err = Document::read(Path::new("/nonexistent/resume.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Io { .. }));
    }

    #[tokio::test]
    async fn test_auto_extractor_reads_text_resumes() {
        let text = AutoExtractor.extract(b"Skills: Rust, Go").await.unwrap();
        assert_eq!(text, "Skills: Rust, Go");
    }

    #[tokio::test]
    async fn test_auto_extractor_routes_pdf_magic_to_pdf_parser() {
        let err = AutoExtractor.extract(b"%PDF-1.7 truncated").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    #[test]
    fn test_normalize_pdf_ligatures() {
        assert_eq!(
            normalize_pdf_text("e\u{FB03}cient \u{FB01}nance\u{00A0}team\r\n"),
            "efficient finance team\n"
        );
    }

    #[tokio::test]
    async fn test_digest_cache_hashes_unchanged_document_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        tokio::fs::write(&path, "Skills: Rust").await.unwrap();
        let cache = DigestCache::default();

        let first = cache.sha256_of(&path).await.unwrap();
        let second = cache.sha256_of(&path).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, sha256_hex(b"Skills: Rust"));
        assert_eq!(cache.computed(), 1);

        tokio::fs::write(&path, "Skills: Rust, Go, SQL").await.unwrap();
        let changed = cache.sha256_of(&path).await.unwrap();
        assert_eq!(changed, sha256_hex(b"Skills: Rust, Go, SQL"));
        assert_eq!(cache.computed(), 2);
    }

    #[tokio::test]
    async fn test_digest_cache_missing_document_is_io_error() {
        let cache = DigestCache::default();
        assert!(cache.sha256_of(Path::new("/nonexistent/resume.pdf")).await.is_err());
    }

    #[test]
    fn test_sha256_is_stable() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
