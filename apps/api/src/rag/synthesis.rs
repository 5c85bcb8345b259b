//! Answer Synthesizer — grounds the generation service in retrieved resume chunks.

use tracing::debug;

use crate::llm_client::GenerationProvider;
use crate::rag::error::SynthesisError;
use crate::rag::prompts::{answer_prompt, ANSWER_SYSTEM, CONTEXT_DELIMITER};

/// Joins chunks, in retrieval order, with `CONTEXT_DELIMITER`.
pub fn build_context<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

/// Sends the grounded prompt once and returns the generated text unmodified.
pub async fn answer<S: AsRef<str>>(
    query: &str,
    chunks: &[S],
    llm: &dyn GenerationProvider,
) -> Result<String, SynthesisError> {
    let context = build_context(chunks);
    let prompt = answer_prompt(&context, query);
    debug!(
        "Synthesizing answer with {} via {} ({} context chars)",
        chunks.len(),
        llm.model(),
        context.chars().count()
    );
    Ok(llm.complete(ANSWER_SYSTEM, &prompt).await?)
}
