// crates/server/src/routes/jobs.rs
//! Background conversion jobs.
//!
//! - POST /jobs/pdf-to-word - accept an upload, answer 202 with a job id
//! - POST /jobs/word-to-pdf - same, for Word → PDF
//!
//! Progress then streams from `/progress/{job_id}` and the result comes
//! from `/download/{job_id}`.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use docbridge_core::files::sibling_with_extension;
use docbridge_core::ConversionKind;
use serde::Serialize;

use super::upload::receive_upload;
use crate::error::ApiResult;
use crate::jobs::{ConversionTask, JobId};
use crate::state::AppState;

/// Body of a 202 response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct JobAccepted {
    pub job_id: JobId,
}

/// POST /jobs/pdf-to-word
pub async fn submit_pdf_to_word(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    submit(state, multipart, ConversionKind::PdfToWord).await
}

/// POST /jobs/word-to-pdf
pub async fn submit_word_to_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    submit(state, multipart, ConversionKind::WordToPdf).await
}

async fn submit(
    state: Arc<AppState>,
    mut multipart: Multipart,
    kind: ConversionKind,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let upload = receive_upload(&state, &mut multipart, kind).await?;

    let job_id = state.registry.create_job(kind);
    let output = sibling_with_extension(&upload.path, kind.output_extension());
    state.worker.spawn(ConversionTask {
        job_id,
        kind,
        source: upload.path,
        output,
        original_name: upload.name.original().to_string(),
    });
    tracing::info!(job_id = %job_id, kind = %kind, "Job accepted");

    Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id })))
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs/pdf-to-word", post(submit_pdf_to_word))
        .route("/jobs/word-to-pdf", post(submit_word_to_pdf))
}
