mod company;
mod config;
mod embeddings;
mod errors;
mod extraction;
mod jobs;
mod llm_client;
mod profile;
mod rag;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::company::{CompanyResearcher, RapidApiResearcher};
use crate::config::Config;
use crate::embeddings::OpenAiEmbedder;
use crate::extraction::AutoExtractor;
use crate::jobs::JobSearcher;
use crate::llm_client::LlmClient;
use crate::rag::ResumeQa;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume QA API v{}", env!("CARGO_PKG_VERSION"));

    // One HTTP client shared by the embedding and generation services
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;

    let embedder = OpenAiEmbedder::new(
        http.clone(),
        config.openai_api_key.clone(),
        &config.openai_base_url,
        config.embedding_model.clone(),
    );
    info!("Embedding client initialized (model: {})", config.embedding_model);

    let llm = Arc::new(LlmClient::new(
        http.clone(),
        config.openai_api_key.clone(),
        &config.openai_base_url,
        config.generation_model.clone(),
    ));
    info!("LLM client initialized (model: {})", config.generation_model);

    let jobs = JobSearcher::new(llm.clone());

    let company: Option<Arc<dyn CompanyResearcher>> = match &config.rapidapi_key {
        Some(key) => {
            info!("Company research enabled (host: {})", config.company_api_host);
            Some(Arc::new(RapidApiResearcher::new(
                http,
                key.clone(),
                config.company_api_host.clone(),
            )))
        }
        None => {
            warn!("RAPIDAPI_KEY not set; company research is disabled");
            None
        }
    };

    let qa = ResumeQa::new(Arc::new(AutoExtractor), Arc::new(embedder), llm)
        .with_chunk_params(config.chunk)
        .with_top_k(config.top_k)
        .with_call_timeout(config.request_timeout)
        .with_rebuild_if_stale(config.rebuild_if_stale);
    info!(
        "Resume {} indexed at {} (chunk size {}, overlap {}, top_k {})",
        config.resume_file.display(),
        config.vector_store_path.display(),
        config.chunk.size(),
        config.chunk.overlap(),
        config.top_k
    );

    let shutdown = CancellationToken::new();

    // Build app state
    let state = AppState {
        qa: Arc::new(qa),
        jobs: Arc::new(jobs),
        company,
        config: config.clone(),
        shutdown: shutdown.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C and cancels in-flight pipeline calls.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown requested, cancelling in-flight requests");
    shutdown.cancel();
}
