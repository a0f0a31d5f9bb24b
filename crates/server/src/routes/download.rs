// crates/server/src/routes/download.rs
//! File delivery for finished jobs.
//!
//! - GET /download/{job_id} - stream the converted file as an attachment
//!
//! The result is peeked, not taken: repeated downloads work until the
//! worker's retention period ends and it removes the file and the job.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio_util::io::ReaderStream;

use crate::error::{ApiError, ApiResult};
use crate::jobs::JobId;
use crate::state::AppState;

/// `Content-Disposition` for `name`: an ASCII fallback plus the exact
/// UTF-8 name in `filename*`.
pub fn content_disposition(name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(name)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Headers for an attachment download.
pub fn attachment_headers(name: &str, mime: &'static str, len: Option<u64>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(mime));
    headers.insert(CONTENT_DISPOSITION, content_disposition(name));
    if let Some(len) = len {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    }
    headers
}

/// GET /download/{job_id} - stream the finished artifact.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let id: JobId = job_id
        .parse()
        .map_err(|_| ApiError::JobNotFound(job_id.clone()))?;
    let channel = state
        .registry
        .lookup(&id)
        .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))?;
    let result = channel.result().cloned().ok_or(ApiError::NotReady(id))?;

    let file = match tokio::fs::File::open(&result.path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::FileMissing(result.path));
        }
        Err(source) => {
            return Err(ApiError::Delivery {
                path: result.path,
                source,
            })
        }
    };
    let len = file.metadata().await.ok().map(|m| m.len());

    let name = result.download_name();
    let age_ms = (chrono::Utc::now() - channel.created_at()).num_milliseconds();
    tracing::info!(
        job_id = %id,
        kind = %channel.kind(),
        file = %name,
        bytes = ?len,
        age_ms,
        "Serving converted file"
    );
    let headers = attachment_headers(&name, result.kind.output_mime(), len);
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// Build the download router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/download/{job_id}", get(download))
}
