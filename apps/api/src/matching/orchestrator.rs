//! The two pipeline operations: ingest and match.
//!
//! Ingest is strict: extraction, validation, chunking and embedding must
//! succeed or the caller gets an error, because no meaningful document exists
//! without them. Match is lenient: vector retrieval and the judge are both
//! best-effort, each with an explicit degradation branch.

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{self, ResultCache};
use crate::chunker::chunk_text;
use crate::embeddings::EmbeddingProvider;
use crate::errors::AppError;
use crate::extract::extract_text;
use crate::llm_client::MatchJudge;
use crate::matching::fallback::score_fallback;
use crate::matching::parser::{parse_match_response, ParsedResponse};
use crate::matching::prompts::build_match_prompt;
use crate::models::document::DocKind;
use crate::models::report::{MatchResult, UploadResponse};
use crate::vector_store::VectorStore;

const RETRIEVAL_TOP_K: usize = 10;

/// Where the document text comes from: an uploaded file, or raw text pasted
/// into the job form.
pub enum DocumentSource {
    File { bytes: Bytes, filename: String },
    RawText(String),
}

/// Ingest pipeline: extract → validate → chunk → embed → best-effort vector
/// upsert → cache. Partial cache writes are not rolled back (at-least-once).
pub async fn ingest_document(
    cache: &ResultCache,
    vectors: Option<&VectorStore>,
    embedder: &dyn EmbeddingProvider,
    kind: DocKind,
    source: DocumentSource,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<UploadResponse, AppError> {
    let doc_id = Uuid::new_v4().to_string();

    let text = match source {
        DocumentSource::File { bytes, filename } => extract_text(&bytes, &filename)?,
        DocumentSource::RawText(text) => text,
    };

    let trimmed_len = text.trim().len();
    if trimmed_len < kind.min_text_len() {
        return Err(AppError::Validation(format!(
            "{} text is too short to process ({} chars, minimum {})",
            kind.label(),
            trimmed_len,
            kind.min_text_len()
        )));
    }

    let chunks = chunk_text(&text, chunk_size, chunk_overlap);
    let batch = embedder.embed(&chunks).await;

    let stored = match vectors {
        Some(store) => store.upsert(kind, &doc_id, &chunks, &batch.vectors).await,
        None => {
            info!("Vector store absent, skipping storage");
            false
        }
    };

    cache.set(&cache::text_key(kind, &doc_id), &text).await;
    cache.set(&cache::chunks_key(kind, &doc_id), &chunks).await;
    cache
        .set(&cache::embeddings_key(kind, &doc_id), &batch.vectors)
        .await;

    info!(
        doc_id = %doc_id,
        kind = %kind,
        chunks = chunks.len(),
        stored,
        degraded = batch.degraded,
        "document ingested"
    );

    Ok(UploadResponse {
        job_id: doc_id,
        message: format!("{} uploaded and processed successfully", kind.label()),
    })
}

/// Match pipeline: memoized result check → load cached artifacts → best-effort
/// retrieval → judge or fallback → cache → return.
pub async fn match_documents(
    cache: &ResultCache,
    vectors: Option<&VectorStore>,
    judge: Option<&dyn MatchJudge>,
    resume_id: &str,
    job_id: &str,
) -> Result<MatchResult, AppError> {
    let result_key = cache::result_key(resume_id, job_id);
    if let Some(memoized) = cache.get::<MatchResult>(&result_key).await {
        info!(resume_id = %resume_id, job_id = %job_id, "returning memoized match result");
        return Ok(memoized);
    }

    let job_text: String = cache
        .get(&cache::text_key(DocKind::Job, job_id))
        .await
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    let job_embeddings: Vec<Vec<f32>> = cache
        .get(&cache::embeddings_key(DocKind::Job, job_id))
        .await
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    let resume_text: String = cache
        .get(&cache::text_key(DocKind::Resume, resume_id))
        .await
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))?;

    // Retrieval degradation branch: any failure (store absent, no embeddings,
    // query error) collapses to "no retrieved chunks".
    let retrieved = match (vectors, job_embeddings.first()) {
        (Some(store), Some(query_vector)) => {
            store.query(query_vector, RETRIEVAL_TOP_K, DocKind::Resume).await
        }
        _ => Vec::new(),
    };
    let context = if retrieved.is_empty() {
        resume_text.clone()
    } else {
        retrieved
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    };

    let prompt = build_match_prompt(&job_text, &context);
    let result = judge_or_fallback(judge, &prompt, &resume_text, &job_text).await;

    cache.set(&result_key, &result).await;
    Ok(result)
}

/// Judge degradation branch: absent judge, failed call, and unparseable output
/// all route to the deterministic fallback scorer.
async fn judge_or_fallback(
    judge: Option<&dyn MatchJudge>,
    prompt: &str,
    resume_text: &str,
    job_text: &str,
) -> MatchResult {
    let Some(judge) = judge else {
        warn!("No judge configured; using fallback scorer");
        return score_fallback(resume_text, job_text);
    };

    match judge.complete(prompt).await {
        Ok(raw) => match parse_match_response(&raw) {
            ParsedResponse::Parsed(result) => result,
            ParsedResponse::Unparseable => {
                warn!("Judge response unparseable; using fallback scorer");
                score_fallback(resume_text, job_text)
            }
        },
        Err(e) => {
            warn!("Judge call failed: {e}; using fallback scorer");
            score_fallback(resume_text, job_text)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::embeddings::EmbeddingBatch;
    use crate::llm_client::LlmError;

    const RESUME_TEXT: &str =
        "Resume: seasoned backend engineer, Python and Docker, shipped services on AWS.";
    const JOB_TEXT: &str = "Job Description: Python developer with Docker experience.";

    struct FixedEmbedder {
        dim: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn dimension(&self) -> usize {
            self.dim
        }

        async fn embed(&self, chunks: &[String]) -> EmbeddingBatch {
            EmbeddingBatch {
                vectors: chunks.iter().map(|_| vec![0.5; self.dim]).collect(),
                degraded: false,
            }
        }
    }

    /// Judge returning a canned response, counting invocations.
    struct ScriptedJudge {
        response: Result<String, ()>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MatchJudge for ScriptedJudge {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(LlmError::EmptyContent),
            }
        }
    }

    async fn ingest_pair(cache: &ResultCache, embedder: &dyn EmbeddingProvider) -> (String, String) {
        let resume = ingest_document(
            cache,
            None,
            embedder,
            DocKind::Resume,
            DocumentSource::RawText(RESUME_TEXT.to_string()),
            1000,
            200,
        )
        .await
        .unwrap();
        let job = ingest_document(
            cache,
            None,
            embedder,
            DocKind::Job,
            DocumentSource::RawText(JOB_TEXT.to_string()),
            1000,
            200,
        )
        .await
        .unwrap();
        (resume.job_id, job.job_id)
    }

    #[tokio::test]
    async fn test_ingest_succeeds_without_vector_store() {
        let cache = ResultCache::in_memory(3600);
        let embedder = FixedEmbedder { dim: 384 };
        let response = ingest_document(
            &cache,
            None,
            &embedder,
            DocKind::Resume,
            DocumentSource::RawText(RESUME_TEXT.to_string()),
            1000,
            200,
        )
        .await
        .unwrap();

        let text: Option<String> = cache
            .get(&cache::text_key(DocKind::Resume, &response.job_id))
            .await;
        assert_eq!(text.as_deref(), Some(RESUME_TEXT));

        let embeddings: Option<Vec<Vec<f32>>> = cache
            .get(&cache::embeddings_key(DocKind::Resume, &response.job_id))
            .await;
        assert_eq!(embeddings.unwrap()[0].len(), 384);
    }

    #[tokio::test]
    async fn test_ingest_succeeds_when_vector_upsert_fails() {
        let cache = ResultCache::in_memory(3600);
        let embedder = FixedEmbedder { dim: 384 };
        // Port 9 refuses connections, so every upsert against this store fails
        // and is absorbed as stored = false.
        let store = VectorStore::new("http://127.0.0.1:9".to_string(), "k".to_string());

        let response = ingest_document(
            &cache,
            Some(&store),
            &embedder,
            DocKind::Resume,
            DocumentSource::RawText(RESUME_TEXT.to_string()),
            1000,
            200,
        )
        .await
        .unwrap();

        // Cache-only operation: all artifacts are still written.
        let text: Option<String> = cache
            .get(&cache::text_key(DocKind::Resume, &response.job_id))
            .await;
        assert_eq!(text.as_deref(), Some(RESUME_TEXT));

        let chunks: Option<Vec<String>> = cache
            .get(&cache::chunks_key(DocKind::Resume, &response.job_id))
            .await;
        assert!(chunks.is_some());

        let embeddings: Option<Vec<Vec<f32>>> = cache
            .get(&cache::embeddings_key(DocKind::Resume, &response.job_id))
            .await;
        assert_eq!(embeddings.unwrap()[0].len(), 384);
    }

    #[tokio::test]
    async fn test_ingest_rejects_short_text() {
        let cache = ResultCache::in_memory(3600);
        let embedder = FixedEmbedder { dim: 384 };
        let err = ingest_document(
            &cache,
            None,
            &embedder,
            DocKind::Resume,
            DocumentSource::RawText("too short".to_string()),
            1000,
            200,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Job threshold is lower; the same text passes as a job.
        let ok = ingest_document(
            &cache,
            None,
            &embedder,
            DocKind::Job,
            DocumentSource::RawText("short job posting text".to_string()),
            1000,
            200,
        )
        .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_match_unknown_job_and_resume_are_distinct_not_found() {
        let cache = ResultCache::in_memory(3600);
        let embedder = FixedEmbedder { dim: 384 };

        let err = match_documents(&cache, None, None, "r-missing", "j-missing")
            .await
            .unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.starts_with("Job"), "{msg}"),
            other => panic!("expected NotFound, got {other:?}"),
        }

        // Ingest only the job: now the resume is the missing one.
        let job = ingest_document(
            &cache,
            None,
            &embedder,
            DocKind::Job,
            DocumentSource::RawText(JOB_TEXT.to_string()),
            1000,
            200,
        )
        .await
        .unwrap();
        let err = match_documents(&cache, None, None, "r-missing", &job.job_id)
            .await
            .unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.starts_with("Resume"), "{msg}"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_match_is_memoized_and_skips_judge_on_second_call() {
        let cache = ResultCache::in_memory(3600);
        let embedder = FixedEmbedder { dim: 384 };
        let (resume_id, job_id) = ingest_pair(&cache, &embedder).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let judge = ScriptedJudge {
            response: Ok(r#"{"match_score": 88, "matching_skills": ["Python", "Docker"], "missing_skills": [], "ats_suggestions": [], "learning_resources": []}"#.to_string()),
            calls: calls.clone(),
        };

        let first = match_documents(&cache, None, Some(&judge), &resume_id, &job_id)
            .await
            .unwrap();
        assert_eq!(first.match_score, 88);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = match_documents(&cache, None, Some(&judge), &resume_id, &job_id)
            .await
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "judge must not be re-invoked");
    }

    #[tokio::test]
    async fn test_judge_call_failure_yields_exact_fallback_output() {
        let cache = ResultCache::in_memory(3600);
        let embedder = FixedEmbedder { dim: 384 };
        let (resume_id, job_id) = ingest_pair(&cache, &embedder).await;

        let judge = ScriptedJudge {
            response: Err(()),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let result = match_documents(&cache, None, Some(&judge), &resume_id, &job_id)
            .await
            .unwrap();
        assert_eq!(result, score_fallback(RESUME_TEXT, JOB_TEXT));
    }

    #[tokio::test]
    async fn test_unparseable_judge_output_yields_exact_fallback_output() {
        let cache = ResultCache::in_memory(3600);
        let embedder = FixedEmbedder { dim: 384 };
        let (resume_id, job_id) = ingest_pair(&cache, &embedder).await;

        let judge = ScriptedJudge {
            response: Ok("I am sorry, I cannot help with that request.".to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let result = match_documents(&cache, None, Some(&judge), &resume_id, &job_id)
            .await
            .unwrap();
        assert_eq!(result, score_fallback(RESUME_TEXT, JOB_TEXT));
    }

    #[tokio::test]
    async fn test_absent_judge_uses_fallback_scorer() {
        let cache = ResultCache::in_memory(3600);
        let embedder = FixedEmbedder { dim: 384 };
        let (resume_id, job_id) = ingest_pair(&cache, &embedder).await;

        let result = match_documents(&cache, None, None, &resume_id, &job_id)
            .await
            .unwrap();
        assert_eq!(result, score_fallback(RESUME_TEXT, JOB_TEXT));
        assert!(result.matching_skills.contains(&"Python".to_string()));
    }

    #[tokio::test]
    async fn test_fallback_result_is_memoized_too() {
        let cache = ResultCache::in_memory(3600);
        let embedder = FixedEmbedder { dim: 384 };
        let (resume_id, job_id) = ingest_pair(&cache, &embedder).await;

        let first = match_documents(&cache, None, None, &resume_id, &job_id)
            .await
            .unwrap();

        // A judge configured after the first match must not override the
        // memoized result.
        let calls = Arc::new(AtomicUsize::new(0));
        let judge = ScriptedJudge {
            response: Ok(r#"{"match_score": 1}"#.to_string()),
            calls: calls.clone(),
        };
        let second = match_documents(&cache, None, Some(&judge), &resume_id, &job_id)
            .await
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
