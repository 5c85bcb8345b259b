use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::company::CompanyResearcher;
use crate::config::Config;
use crate::jobs::JobSearcher;
use crate::rag::ResumeQa;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub qa: Arc<ResumeQa>,
    pub jobs: Arc<JobSearcher>,
    /// `None` when no RapidAPI key is configured.
    pub company: Option<Arc<dyn CompanyResearcher>>,
    pub config: Config,
    /// Cancelled on shutdown; each request works under a child token.
    pub shutdown: CancellationToken,
}
