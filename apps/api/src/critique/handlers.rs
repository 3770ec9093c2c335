//! Axum route handlers for resume analysis.

use std::io::Write;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::config::MAX_UPLOAD_BYTES;
use crate::critique::parser::{parse_critique, Critique};
use crate::errors::AppError;
use crate::extract::{extract_text, file_extension, SourceFormat};
use crate::llm_client::prompts::critique_prompt;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub resume_text: String,
}

/// Structured analysis returned by `/upload` and `/analyze`. Sections the
/// model did not produce are omitted rather than reported as errors; the raw
/// reply is always present.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_suggestions: Option<String>,
    /// Legacy field kept for older frontends: bullets if present, else summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_gaps: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improved_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improved_bullet_examples: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_fix_order: Option<String>,
    pub raw_ai_output: String,
}

impl AnalysisResponse {
    fn new(critique: Critique, raw_ai_output: String) -> Self {
        let ai_example = critique
            .improved_bullets
            .clone()
            .or_else(|| critique.improved_summary.clone());
        Self {
            ai_rating: critique.rating,
            ai_suggestions: critique.suggestions,
            ai_example,
            keyword_gaps: critique.keyword_gaps,
            improved_summary: critique.improved_summary,
            improved_bullet_examples: critique.improved_bullets,
            priority_fix_order: critique.priority_fixes,
            raw_ai_output,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /upload
///
/// Accepts a multipart form with a single `resume` file (PDF or DOCX, ≤5 MB),
/// extracts its text, and returns the structured critique. The upload is
/// spooled to a request-unique temp file that is removed on every exit path
/// (dropped with the handler frame).
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let (filename, declared_mime, data) = read_resume_field(&mut multipart).await?;

    if filename.is_empty() {
        return Err(AppError::Validation("Empty filename".to_string()));
    }

    let format = SourceFormat::from_filename(&filename).ok_or_else(|| {
        let ext = file_extension(&filename)
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        AppError::Validation(format!("Unsupported file type {ext}. Allowed: PDF, DOCX"))
    })?;

    if let Some(mime) = &declared_mime {
        if mime != format.mime() {
            return Err(AppError::Validation(format!(
                "Unsupported MIME type {mime}."
            )));
        }
    }

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::PayloadTooLarge(MAX_UPLOAD_BYTES / (1024 * 1024)));
    }

    info!(
        "received upload {} ({} bytes, {:?})",
        filename,
        data.len(),
        format
    );

    let resume_text = {
        let mut temp = NamedTempFile::new()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("temp file creation failed: {e}")))?;
        temp.write_all(&data)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("temp file write failed: {e}")))?;
        temp.flush()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("temp file write failed: {e}")))?;
        extract_text(temp.path(), format)?
        // temp dropped here: the file is deleted whether extraction
        // succeeded or not
    };

    info!("extracted {} characters from {}", resume_text.len(), filename);
    analyze(&state, &resume_text).await
}

/// POST /analyze
///
/// Same pipeline as `/upload` for callers that already have plain text,
/// skipping file handling and extraction.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation("No resume text provided".to_string()));
    }
    analyze(&state, &request.resume_text).await
}

async fn analyze(state: &AppState, resume_text: &str) -> Result<Json<AnalysisResponse>, AppError> {
    let prompt = critique_prompt(resume_text);
    let raw_reply = state.llm.complete(&prompt).await?;
    let critique = parse_critique(&raw_reply);
    Ok(Json(AnalysisResponse::new(critique, raw_reply)))
}

/// Pulls the `resume` field out of the multipart stream.
async fn read_resume_field(
    multipart: &mut Multipart,
) -> Result<(String, Option<String>, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("resume") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let declared_mime = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge(MAX_UPLOAD_BYTES / (1024 * 1024))
            } else {
                AppError::Validation(format!("Invalid file: {e}"))
            }
        })?;
        return Ok((filename, declared_mime, data));
    }
    Err(AppError::Validation("No file uploaded".to_string()))
}
