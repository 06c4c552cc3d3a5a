//! Embedding generation over HTTP with a documented degradation path.
//!
//! The provider never fails the pipeline: any transport or shape error yields
//! one constant-filled vector per chunk and marks the batch as degraded so
//! callers can tell fidelity was lost.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Fill value for dummy vectors emitted on embedding failure.
pub const DUMMY_EMBEDDING_VALUE: f32 = 0.1;

const REQUEST_TIMEOUT_SECS: u64 = 15;

/// One embedding per input chunk, order preserved. `degraded` is true when the
/// vectors are dummy fills rather than model output.
#[derive(Debug, Clone)]
pub struct EmbeddingBatch {
    pub vectors: Vec<Vec<f32>>,
    pub degraded: bool,
}

/// Seam for embedding backends. Carried in `AppState` as
/// `Arc<dyn EmbeddingProvider>` so tests can inject fixed vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn dimension(&self) -> usize;
    async fn embed(&self, chunks: &[String]) -> EmbeddingBatch;
}

#[derive(Debug, Error)]
enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("embedding count {got} does not match chunk count {want}")]
    CountMismatch { got: usize, want: usize },

    #[error("embedding dimension {got} does not match configured dimension {want}")]
    DimensionMismatch { got: usize, want: usize },
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for an Ollama-compatible `/api/embed` endpoint.
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dim: usize,
}

impl HttpEmbeddingClient {
    pub fn new(base_url: String, model: String, dim: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dim,
        }
    }

    async fn request(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&EmbedRequest {
                model: &self.model,
                input: chunks,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbedResponse = response.json().await?;
        if body.embeddings.len() != chunks.len() {
            return Err(EmbeddingError::CountMismatch {
                got: body.embeddings.len(),
                want: chunks.len(),
            });
        }
        if let Some(bad) = body.embeddings.iter().find(|v| v.len() != self.dim) {
            return Err(EmbeddingError::DimensionMismatch {
                got: bad.len(),
                want: self.dim,
            });
        }
        Ok(body.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed(&self, chunks: &[String]) -> EmbeddingBatch {
        if chunks.is_empty() {
            return EmbeddingBatch {
                vectors: Vec::new(),
                degraded: false,
            };
        }

        match self.request(chunks).await {
            Ok(vectors) => {
                debug!(count = vectors.len(), dim = self.dim, "embeddings generated");
                EmbeddingBatch {
                    vectors,
                    degraded: false,
                }
            }
            Err(e) => {
                warn!("Embedding generation failed: {e}; using dummy embeddings");
                EmbeddingBatch {
                    vectors: chunks
                        .iter()
                        .map(|_| vec![DUMMY_EMBEDDING_VALUE; self.dim])
                        .collect(),
                    degraded: true,
                }
            }
        }
    }
}
