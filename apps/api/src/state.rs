use std::sync::Arc;

use crate::cache::ResultCache;
use crate::config::Config;
use crate::embeddings::EmbeddingProvider;
use crate::llm_client::MatchJudge;
use crate::vector_store::VectorStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every component is constructed exactly once, during the startup phase in
/// `main`; request handling never re-probes or re-initializes. Capabilities
/// that failed their probe (vector store, judge) are `None`, and the pipeline
/// degrades around them.
#[derive(Clone)]
pub struct AppState {
    pub cache: ResultCache,
    /// Absent when Pinecone credentials are not configured (nil-capability).
    pub vectors: Option<Arc<VectorStore>>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Absent when no LLM API key is configured; match requests then use the
    /// fallback scorer.
    pub judge: Option<Arc<dyn MatchJudge>>,
    pub config: Config,
}
