pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::company::handlers as company;
use crate::jobs::handlers as jobs;
use crate::rag::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/query", post(handlers::handle_query))
        .route("/api/v1/index/rebuild", post(handlers::handle_rebuild))
        .route("/api/v1/resume", post(handlers::handle_upload))
        .route("/api/v1/resume/analyze", post(handlers::handle_analyze))
        .route("/api/v1/jobs/search", post(jobs::handle_job_search))
        .route(
            "/api/v1/company/research",
            post(company::handle_company_research),
        )
        .with_state(state)
}
