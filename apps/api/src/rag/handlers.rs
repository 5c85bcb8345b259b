use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::profile::{analyze_resume, ResumeProfile};
use crate::rag::store::VectorStore;
use crate::rag::QueryParams;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub force_rebuild: bool,
    pub top_k: Option<usize>,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    pub chunks: usize,
    pub dimension: usize,
}

impl From<&VectorStore> for IndexResponse {
    fn from(store: &VectorStore) -> Self {
        Self {
            chunks: store.len(),
            dimension: store.dimension(),
        }
    }
}

/// POST /api/v1/query
pub async fn handle_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(AppError::Validation("query must not be empty".to_string()));
    }
    if req.top_k == Some(0) {
        return Err(AppError::Validation("top_k must be at least 1".to_string()));
    }

    let cancel = state.shutdown.child_token();
    let answer = state
        .qa
        .answer_query(
            QueryParams {
                query: &req.query,
                document: &state.config.resume_file,
                storage_path: &state.config.vector_store_path,
                force_rebuild: req.force_rebuild,
                top_k: req.top_k,
            },
            &cancel,
        )
        .await?;
    Ok(Json(QueryResponse { answer }))
}

/// POST /api/v1/index/rebuild
pub async fn handle_rebuild(State(state): State<AppState>) -> Result<Json<IndexResponse>, AppError> {
    let store = rebuild(&state).await?;
    Ok(Json(IndexResponse::from(&store)))
}

/// POST /api/v1/resume
/// Replaces the resume document with the uploaded `file` field and rebuilds the index.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IndexResponse>, AppError> {
    let mut upload: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
            upload = Some(data);
        }
    }

    let data = upload.ok_or_else(|| AppError::Validation("missing 'file' field".to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    info!(
        "Received resume upload ({} bytes) for {}",
        data.len(),
        state.config.resume_file.display()
    );
    let cancel = state.shutdown.child_token();
    let store = state
        .qa
        .replace_document(
            &state.config.resume_file,
            &state.config.vector_store_path,
            data.to_vec(),
            &cancel,
        )
        .await?;
    Ok(Json(IndexResponse::from(&store)))
}

/// POST /api/v1/resume/analyze
pub async fn handle_analyze(State(state): State<AppState>) -> Result<Json<ResumeProfile>, AppError> {
    let cancel = state.shutdown.child_token();
    let profile = analyze_resume(
        &state.qa,
        &state.config.resume_file,
        &state.config.vector_store_path,
        &cancel,
    )
    .await?;
    Ok(Json(profile))
}

async fn rebuild(state: &AppState) -> Result<VectorStore, AppError> {
    let cancel = state.shutdown.child_token();
    let store = state
        .qa
        .obtain_store(
            &state.config.resume_file,
            &state.config.vector_store_path,
            true,
            &cancel,
        )
        .await?;
    Ok(store)
}
