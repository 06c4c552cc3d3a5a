use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// Only the serving basics are required. The Pinecone pair and the OpenRouter
/// key are optional on purpose: when absent, the corresponding capability is
/// simply not constructed and the pipeline runs in its degraded mode.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub pinecone_api_key: Option<String>,
    pub pinecone_index_host: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub llm_model: String,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub cache_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            redis_url: env_or("REDIS_URL", "redis://localhost:6379"),
            pinecone_api_key: optional_env("PINECONE_API_KEY"),
            pinecone_index_host: optional_env("PINECONE_INDEX_HOST"),
            openrouter_api_key: optional_env("OPENROUTER_API_KEY"),
            llm_model: env_or("LLM_MODEL", "mistralai/mistral-7b-instruct"),
            embedding_url: env_or("EMBEDDING_URL", "http://localhost:11434"),
            embedding_model: env_or("EMBEDDING_MODEL", "mxbai-embed-large"),
            embedding_dim: parsed_env("EMBEDDING_DIM", 1024)?,
            chunk_size: parsed_env("CHUNK_SIZE", 1000)?,
            chunk_overlap: parsed_env("CHUNK_OVERLAP", 200)?,
            cache_ttl_secs: parsed_env("CACHE_TTL_SECS", 3600)?,
            port: parsed_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Missing and empty both count as unset, so a blank line in `.env` does not
/// fabricate a capability.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
