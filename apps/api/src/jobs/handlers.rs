use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::{JobFilters, JobListing};
use crate::profile::{analyze_resume, ResumeProfile};
use crate::rag::cancel::CallGuard;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct JobSearchRequest {
    /// Analyzed from the stored resume when omitted.
    #[serde(default)]
    pub profile: Option<ResumeProfile>,
    #[serde(default)]
    pub filters: JobFilters,
}

#[derive(Serialize)]
pub struct JobSearchResponse {
    pub profile: ResumeProfile,
    pub jobs: Vec<JobListing>,
}

/// POST /api/v1/jobs/search
pub async fn handle_job_search(
    State(state): State<AppState>,
    Json(req): Json<JobSearchRequest>,
) -> Result<Json<JobSearchResponse>, AppError> {
    let cancel = state.shutdown.child_token();
    let profile = match req.profile {
        Some(profile) => profile,
        None => {
            analyze_resume(
                &state.qa,
                &state.config.resume_file,
                &state.config.vector_store_path,
                &cancel,
            )
            .await?
        }
    };
    if profile.skills.is_empty() && profile.experience_summary.trim().is_empty() {
        return Err(AppError::Validation(
            "profile needs at least one skill or an experience summary".to_string(),
        ));
    }

    let guard = CallGuard::new(cancel, state.config.request_timeout);
    let jobs = guard.run(state.jobs.search(&profile, &req.filters)).await??;
    Ok(Json(JobSearchResponse { profile, jobs }))
}
