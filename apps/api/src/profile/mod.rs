// Resume analysis: a structured profile built from two fixed questions.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::rag::error::RagError;
use crate::rag::prompts::{EXPERIENCE_QUESTION, SKILLS_QUESTION};
use crate::rag::{QueryParams, ResumeQa};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeProfile {
    pub skills: Vec<String>,
    pub experience_summary: String,
}

/// Splits a comma-separated answer into trimmed, non-empty skills.
pub fn parse_skills(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Asks the skills and experience questions against the resume index.
/// The first question builds the index if needed; the second reuses it.
pub async fn analyze_resume(
    qa: &ResumeQa,
    document: &Path,
    storage_path: &Path,
    cancel: &CancellationToken,
) -> Result<ResumeProfile, RagError> {
    let skills_answer = qa
        .answer_query(
            QueryParams {
                query: SKILLS_QUESTION,
                document,
                storage_path,
                force_rebuild: false,
                top_k: None,
            },
            cancel,
        )
        .await?;

    let experience_summary = qa
        .answer_query(
            QueryParams {
                query: EXPERIENCE_QUESTION,
                document,
                storage_path,
                force_rebuild: false,
                top_k: None,
            },
            cancel,
        )
        .await?;

    let skills = parse_skills(&skills_answer);
    info!("Resume analysis extracted {} skills", skills.len());

    Ok(ResumeProfile {
        skills,
        experience_summary: experience_summary.trim().to_string(),
    })
}
