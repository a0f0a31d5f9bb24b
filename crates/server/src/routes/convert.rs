// crates/server/src/routes/convert.rs
//! Inline conversion: upload, convert, and answer with the file in one request.
//!
//! - POST /convert/pdf-to-word - DOCX attachment
//! - POST /convert/word-to-pdf - PDF attachment

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use docbridge_core::files::{remove_with_retry, sibling_with_extension};
use docbridge_core::ConversionKind;

use super::download::attachment_headers;
use super::upload::receive_upload;
use crate::error::{ApiError, ApiResult};
use crate::jobs::convert_inline;
use crate::state::AppState;

/// POST /convert/pdf-to-word
pub async fn pdf_to_word(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Response> {
    convert(state, multipart, ConversionKind::PdfToWord).await
}

/// POST /convert/word-to-pdf
pub async fn word_to_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Response> {
    convert(state, multipart, ConversionKind::WordToPdf).await
}

async fn convert(
    state: Arc<AppState>,
    mut multipart: Multipart,
    kind: ConversionKind,
) -> ApiResult<Response> {
    let upload = receive_upload(&state, &mut multipart, kind).await?;
    let output = sibling_with_extension(&upload.path, kind.output_extension());

    let converted = match convert_inline(&state.worker, kind, &upload.path, &output).await {
        Ok(()) => tokio::fs::read(&output)
            .await
            .map_err(|source| ApiError::Delivery {
                path: output.clone(),
                source,
            }),
        Err(err) => Err(err.into()),
    };

    // Both temp files go regardless of outcome.
    remove_with_retry(&upload.path, state.remove_policy).await;
    remove_with_retry(&output, state.remove_policy).await;

    let bytes = converted?;
    let name = docbridge_core::download_name(upload.name.original(), kind);
    tracing::info!(file = %name, bytes = bytes.len(), kind = %kind, "Inline conversion finished");
    let headers = attachment_headers(&name, kind.output_mime(), Some(bytes.len() as u64));
    Ok((headers, bytes).into_response())
}

/// Build the inline conversion router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/convert/pdf-to-word", post(pdf_to_word))
        .route("/convert/word-to-pdf", post(word_to_pdf))
}
