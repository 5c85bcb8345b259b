use axum::{extract::State, Json};
use serde::Deserialize;

use crate::company::{CompanyError, CompanyReport};
use crate::errors::AppError;
use crate::rag::cancel::CallGuard;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CompanyResearchRequest {
    pub company_name: String,
}

/// POST /api/v1/company/research
pub async fn handle_company_research(
    State(state): State<AppState>,
    Json(req): Json<CompanyResearchRequest>,
) -> Result<Json<CompanyReport>, AppError> {
    let name = req.company_name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("company_name must not be empty".to_string()));
    }
    let researcher = state.company.as_ref().ok_or(CompanyError::NotConfigured)?;

    let guard = CallGuard::new(state.shutdown.child_token(), state.config.request_timeout);
    let report = guard.run(researcher.research(name)).await??;
    Ok(Json(report))
}
