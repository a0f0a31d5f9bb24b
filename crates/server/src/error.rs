// crates/server/src/error.rs
use std::path::PathBuf;

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docbridge_core::{DocumentError, ValidationError};
use serde::Serialize;
use thiserror::Error;

use crate::jobs::JobId;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Failure while converting a document, in a job or inline.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("conversion engine stopped unexpectedly: {0}")]
    Panicked(String),
}

impl From<tokio::task::JoinError> for ConversionError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Panicked(err.to_string())
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job not ready: {0}")]
    NotReady(JobId),

    #[error("Result file missing: {0}")]
    FileMissing(PathBuf),

    #[error("Conversion failed: {0}")]
    ConversionFailed(#[from] ConversionError),

    #[error("Failed to deliver {path}: {source}")]
    Delivery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to store upload {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::Validation(err) => {
                tracing::warn!(error = %err, "Upload rejected");
                (StatusCode::BAD_REQUEST, ErrorResponse::new(err.to_string()))
            }
            ApiError::Multipart(err) => {
                tracing::warn!(error = %err, "Malformed multipart body");
                let status = err.status();
                let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "File too large"
                } else {
                    "Invalid upload"
                };
                (status, ErrorResponse::with_details(message, err.body_text()))
            }
            ApiError::JobNotFound(id) => {
                tracing::warn!(job_id = %id, "Download for unknown job");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("File not found or expired"),
                )
            }
            ApiError::NotReady(id) => {
                tracing::info!(job_id = %id, "Download before result was ready");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("File is not ready yet"),
                )
            }
            ApiError::FileMissing(path) => {
                tracing::warn!(path = %path.display(), "Result file vanished before download");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("File not found or expired"),
                )
            }
            ApiError::ConversionFailed(err) => {
                tracing::error!(error = %err, "Conversion failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(format!("Conversion failed: {err}")),
                )
            }
            ApiError::Delivery { path, source } => {
                tracing::error!(path = %path.display(), error = %source, "Failed to open result file");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Failed to deliver file", source.to_string()),
                )
            }
            ApiError::Storage { path, source } => {
                tracing::error!(path = %path.display(), error = %source, "Failed to store upload");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Failed to store upload", source.to_string()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
