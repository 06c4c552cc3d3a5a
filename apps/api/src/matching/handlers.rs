//! Axum route handlers for the matching API. Thin glue: multipart unpacking
//! and validation shape live here, the pipeline itself lives in the
//! orchestrator.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;

use crate::errors::AppError;
use crate::extract::is_supported;
use crate::matching::orchestrator::{ingest_document, match_documents, DocumentSource};
use crate::models::document::DocKind;
use crate::models::report::{MatchRequest, MatchResult, UploadResponse};
use crate::state::AppState;

/// POST /upload/resume
///
/// Multipart with a required `file` field (.pdf, .docx or .txt).
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let fields = read_upload_fields(multipart).await?;
    let Some((filename, bytes)) = fields.file else {
        return Err(AppError::Validation("A resume file is required".to_string()));
    };
    if !is_supported(&filename) {
        return Err(AppError::Validation(
            "Invalid file type. Only PDF, DOCX, TXT allowed.".to_string(),
        ));
    }

    let response = ingest_document(
        &state.cache,
        state.vectors.as_deref(),
        state.embedder.as_ref(),
        DocKind::Resume,
        DocumentSource::File { bytes, filename },
        state.config.chunk_size,
        state.config.chunk_overlap,
    )
    .await?;
    Ok(Json(response))
}

/// POST /upload/job
///
/// Multipart with either a `file` field or a raw `text` field.
pub async fn handle_upload_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let fields = read_upload_fields(multipart).await?;
    let source = match (fields.file, fields.text) {
        (Some((filename, bytes)), _) => {
            if !is_supported(&filename) {
                return Err(AppError::Validation(
                    "Invalid file type. Only PDF, DOCX, TXT allowed.".to_string(),
                ));
            }
            DocumentSource::File { bytes, filename }
        }
        (None, Some(text)) => DocumentSource::RawText(text),
        (None, None) => {
            return Err(AppError::Validation(
                "Either file or text must be provided.".to_string(),
            ))
        }
    };

    let response = ingest_document(
        &state.cache,
        state.vectors.as_deref(),
        state.embedder.as_ref(),
        DocKind::Job,
        source,
        state.config.chunk_size,
        state.config.chunk_overlap,
    )
    .await?;
    Ok(Json(response))
}

/// POST /match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResult>, AppError> {
    let result = match_documents(
        &state.cache,
        state.vectors.as_deref(),
        state.judge.as_deref(),
        &request.resume_id,
        &request.job_id,
    )
    .await?;
    Ok(Json(result))
}

struct UploadFields {
    file: Option<(String, Bytes)>,
    text: Option<String>,
}

async fn read_upload_fields(mut multipart: Multipart) -> Result<UploadFields, AppError> {
    let mut fields = UploadFields {
        file: None,
        text: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart request: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                if filename.is_empty() {
                    return Err(AppError::Validation(
                        "Uploaded file has no filename".to_string(),
                    ));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                if bytes.is_empty() {
                    return Err(AppError::Validation("Uploaded file is empty".to_string()));
                }
                fields.file = Some((filename, bytes));
            }
            "text" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read text field: {e}")))?;
                if !text.trim().is_empty() {
                    fields.text = Some(text);
                }
            }
            _ => {}
        }
    }

    Ok(fields)
}
