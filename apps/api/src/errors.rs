use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::company::CompanyError;
use crate::jobs::JobSearchError;
use crate::rag::error::{RagError, RetrievalBuildError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    JobSearch(#[from] JobSearchError),

    #[error(transparent)]
    Company(#[from] CompanyError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Rag(err) => rag_parts(err),
            AppError::JobSearch(err) => {
                tracing::error!("Job search error: {err}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "The job search generation service failed".to_string(),
                )
            }
            AppError::Company(err) => company_parts(err),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

fn rag_parts(err: &RagError) -> (StatusCode, &'static str, String) {
    match err {
        RagError::RetrievalBuild(RetrievalBuildError::Extraction(_)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "EXTRACTION_ERROR",
            err.to_string(),
        ),
        RagError::RetrievalBuild(RetrievalBuildError::Embedding(_)) | RagError::Embedding(_) => {
            tracing::error!("Embedding error: {err}");
            (
                StatusCode::BAD_GATEWAY,
                "EMBEDDING_ERROR",
                "The embedding service failed".to_string(),
            )
        }
        RagError::Synthesis(_) => {
            tracing::error!("Synthesis error: {err}");
            (
                StatusCode::BAD_GATEWAY,
                "LLM_ERROR",
                "The answer generation service failed".to_string(),
            )
        }
        RagError::Cancelled => (
            StatusCode::GATEWAY_TIMEOUT,
            "CANCELLED",
            "The request was cancelled or timed out".to_string(),
        ),
        RagError::RetrievalBuild(RetrievalBuildError::Persist(_))
        | RagError::Store(_)
        | RagError::Retrieval(_) => {
            tracing::error!("Store error: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "The resume index could not be read or written".to_string(),
            )
        }
    }
}

fn company_parts(err: &CompanyError) -> (StatusCode, &'static str, String) {
    match err {
        CompanyError::NotConfigured => (
            StatusCode::SERVICE_UNAVAILABLE,
            "NOT_CONFIGURED",
            err.to_string(),
        ),
        CompanyError::NotFound(_) | CompanyError::NoDetails(_) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
        }
        CompanyError::Http(_) | CompanyError::Api { .. } => {
            tracing::error!("Company API error: {err}");
            (
                StatusCode::BAD_GATEWAY,
                "COMPANY_API_ERROR",
                "The company research service failed".to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
