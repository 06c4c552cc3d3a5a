//! Pinecone-compatible vector store client over REST.
//!
//! The store is a best-effort collaborator: the client is only constructed when
//! credentials are configured (otherwise the capability is absent entirely),
//! upsert reports success as a flag instead of erroring, and query failures
//! collapse to an empty result so the match pipeline can fall back to the raw
//! resume text.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::models::document::DocKind;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A retrieved chunk with its similarity score, ranked best-first.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f32,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: String,
    values: &'a [f32],
    metadata: serde_json::Value,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    metadata: Option<QueryMetadata>,
}

#[derive(Deserialize)]
struct QueryMetadata {
    text: Option<String>,
}

pub struct VectorStore {
    client: reqwest::Client,
    host: String,
    api_key: String,
}

impl VectorStore {
    pub fn new(host: String, api_key: String) -> Self {
        let host = host.trim_end_matches('/').to_string();
        // Pinecone index hosts are handed out without a scheme.
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{host}")
        };
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            host,
            api_key,
        }
    }

    /// `{doc_type}:{doc_id}:{chunk_index}`, stable per chunk, so re-ingesting
    /// the same document id overwrites rather than duplicates.
    pub fn vector_id(kind: DocKind, doc_id: &str, chunk_index: usize) -> String {
        format!("{}:{}:{}", kind.as_str(), doc_id, chunk_index)
    }

    /// Stores one vector per chunk. Returns whether storage actually happened:
    /// a dimension mismatch or any other call failure is absorbed and reported
    /// as `false` so ingest can continue with cache-only operation.
    pub async fn upsert(
        &self,
        kind: DocKind,
        doc_id: &str,
        chunks: &[String],
        embeddings: &[Vec<f32>],
    ) -> bool {
        let vectors: Vec<UpsertVector<'_>> = embeddings
            .iter()
            .zip(chunks)
            .enumerate()
            .map(|(i, (values, chunk))| UpsertVector {
                id: Self::vector_id(kind, doc_id, i),
                values,
                metadata: json!({
                    "text": chunk,
                    "doc_id": doc_id,
                    "doc_type": kind.as_str(),
                }),
            })
            .collect();

        match self.try_upsert(&vectors).await {
            Ok(()) => {
                debug!(doc_id, count = vectors.len(), "vectors stored");
                true
            }
            Err(e) if e.to_string().to_lowercase().contains("dimension") => {
                warn!(
                    "Vector store dimension mismatch for {doc_id}: {e}; \
                     continuing with cache-only operation"
                );
                false
            }
            Err(e) => {
                warn!("Vector store upsert failed for {doc_id}: {e}");
                false
            }
        }
    }

    async fn try_upsert(&self, vectors: &[UpsertVector<'_>]) -> anyhow::Result<()> {
        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.host))
            .header("Api-Key", &self.api_key)
            .json(&json!({ "vectors": vectors }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("status {status}: {body}");
        }
        Ok(())
    }

    /// Nearest-neighbor query filtered by document type. Any failure yields an
    /// empty ranked list; the caller treats that as "retrieval degraded".
    pub async fn query(&self, vector: &[f32], top_k: usize, kind: DocKind) -> Vec<RetrievedChunk> {
        match self.try_query(vector, top_k, kind).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("Vector store query failed: {e}; proceeding without retrieval");
                Vec::new()
            }
        }
    }

    async fn try_query(
        &self,
        vector: &[f32],
        top_k: usize,
        kind: DocKind,
    ) -> anyhow::Result<Vec<RetrievedChunk>> {
        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "vector": vector,
                "topK": top_k,
                "includeMetadata": true,
                "filter": { "doc_type": { "$eq": kind.as_str() } },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("status {status}: {body}");
        }

        let body: QueryResponse = response.json().await?;
        Ok(body
            .matches
            .into_iter()
            .filter_map(|m| {
                m.metadata.and_then(|meta| meta.text).map(|text| RetrievedChunk {
                    text,
                    score: m.score,
                })
            })
            .collect())
    }
}
