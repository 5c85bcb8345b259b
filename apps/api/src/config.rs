use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::company::DEFAULT_COMPANY_API_HOST;
use crate::embeddings::DEFAULT_EMBEDDING_MODEL;
use crate::llm_client::DEFAULT_GENERATION_MODEL;
use crate::rag::chunker::{ChunkParams, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::rag::DEFAULT_TOP_K;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub resume_file: PathBuf,
    pub vector_store_path: PathBuf,
    pub chunk: ChunkParams,
    pub top_k: usize,
    pub request_timeout: Duration,
    pub rebuild_if_stale: bool,
    /// Enables company research when set.
    pub rapidapi_key: Option<String>,
    pub company_api_host: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let chunk_size = parse_env("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = parse_env("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?;
        let chunk = ChunkParams::new(chunk_size, chunk_overlap)
            .context("CHUNK_SIZE / CHUNK_OVERLAP are inconsistent")?;

        let top_k = parse_env("TOP_K", DEFAULT_TOP_K)?;
        if top_k == 0 {
            bail!("TOP_K must be at least 1");
        }

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            embedding_model: env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            generation_model: env_or("GENERATION_MODEL", DEFAULT_GENERATION_MODEL),
            resume_file: PathBuf::from(env_or("RESUME_FILE", "resume.pdf")),
            vector_store_path: PathBuf::from(env_or("VECTOR_STORE_PATH", "vector_store.json")),
            chunk,
            top_k,
            request_timeout: Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 120u64)?),
            rebuild_if_stale: parse_env("REBUILD_IF_STALE", false)?,
            rapidapi_key: optional_env("RAPIDAPI_KEY"),
            company_api_host: env_or("COMPANY_API_HOST", DEFAULT_COMPANY_API_HOST),
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
