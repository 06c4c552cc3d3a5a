mod cache;
mod chunker;
mod config;
mod embeddings;
mod errors;
mod extract;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;
mod vector_store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::ResultCache;
use crate::config::Config;
use crate::embeddings::{EmbeddingProvider, HttpEmbeddingClient};
use crate::llm_client::{LlmClient, MatchJudge};
use crate::routes::build_router;
use crate::state::AppState;
use crate::vector_store::VectorStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Log targets are rooted at the bin crate name, not the package name.
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MatchPoint API v{}", env!("CARGO_PKG_VERSION"));

    // Startup phase: every capability is probed and constructed exactly once
    // here. Request handling composes whatever survived.
    let cache = ResultCache::connect(&config.redis_url, config.cache_ttl_secs).await;

    let vectors = match (&config.pinecone_api_key, &config.pinecone_index_host) {
        (Some(key), Some(host)) => {
            info!("Vector store client initialized");
            Some(Arc::new(VectorStore::new(host.clone(), key.clone())))
        }
        _ => {
            warn!("Pinecone credentials missing; vector storage and retrieval disabled");
            None
        }
    };

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbeddingClient::new(
        config.embedding_url.clone(),
        config.embedding_model.clone(),
        config.embedding_dim,
    ));
    info!(
        "Embedding client initialized (model: {}, dim: {})",
        config.embedding_model, config.embedding_dim
    );

    let judge: Option<Arc<dyn MatchJudge>> = match &config.openrouter_api_key {
        Some(key) => {
            info!("LLM client initialized (model: {})", config.llm_model);
            Some(Arc::new(LlmClient::new(key.clone(), config.llm_model.clone())))
        }
        None => {
            warn!("OPENROUTER_API_KEY not set; match requests will use the fallback scorer");
            None
        }
    };

    let state = AppState {
        cache,
        vectors,
        embedder,
        judge,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
