//! HTTP route handlers for the docbridge server.

pub mod convert;
pub mod download;
pub mod health;
pub mod jobs;
pub mod progress;
pub mod upload;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - GET  /health - Health check
/// - POST /convert/pdf-to-word - Inline PDF → DOCX
/// - POST /convert/word-to-pdf - Inline DOC/DOCX → PDF
/// - POST /jobs/pdf-to-word - Start a background PDF → DOCX job
/// - POST /jobs/word-to-pdf - Start a background DOC/DOCX → PDF job
/// - GET  /progress/{job_id} - SSE stream of job progress
/// - GET  /download/{job_id} - Download a finished job's file
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(convert::router())
        .merge(jobs::router())
        .merge(progress::router())
        .merge(download::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_routes_creation() {
        let state = AppState::builder("/tmp").build();
        let _router = api_routes(state);
    }
}
