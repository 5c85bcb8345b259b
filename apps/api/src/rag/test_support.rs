//! Deterministic stand-ins for the extraction, embedding and generation services.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::embeddings::{EmbeddingError, EmbeddingProvider};
use crate::extraction::{ExtractionError, TextExtractor};
use crate::llm_client::{GenerationProvider, LlmError};

pub const FAKE_DIMENSION: usize = 27;

/// Letter-frequency embedding: one slot per ASCII letter plus a constant slot,
/// so no vector has zero norm. Texts sharing vocabulary score close together.
pub fn letter_histogram(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; FAKE_DIMENSION];
    for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
        vector[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
    }
    vector[FAKE_DIMENSION - 1] = 1.0;
    vector
}

#[derive(Default)]
pub struct FakeEmbedder {
    batches: AtomicUsize,
}

impl FakeEmbedder {
    /// Number of `embed_batch` calls made so far (queries included).
    pub fn calls(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| letter_histogram(t)).collect())
    }

    fn model(&self) -> &str {
        "fake-letters"
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Api {
            status: 429,
            message: "quota exceeded".to_string(),
        })
    }

    fn model(&self) -> &str {
        "failing"
    }
}

pub struct FailingExtractor;

#[async_trait]
impl TextExtractor for FailingExtractor {
    async fn extract(&self, _bytes: &[u8]) -> Result<String, ExtractionError> {
        Err(ExtractionError::Pdf("unsupported encryption".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Records every prompt and answers with a fixed string.
pub struct FakeLlm {
    answer: String,
    prompts: Mutex<Vec<(String, String)>>,
}

impl FakeLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// `(system, prompt)` pairs in call order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for FakeLlm {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        Ok(self.answer.clone())
    }

    fn model(&self) -> &str {
        "fake-llm"
    }
}

pub struct FailingLlm;

#[async_trait]
impl GenerationProvider for FailingLlm {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })
    }

    fn model(&self) -> &str {
        "failing-llm"
    }
}

/// Never responds; used to exercise timeouts and cancellation.
pub struct HangingLlm;

#[async_trait]
impl GenerationProvider for HangingLlm {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
        std::future::pending().await
    }

    fn model(&self) -> &str {
        "hanging-llm"
    }
}
