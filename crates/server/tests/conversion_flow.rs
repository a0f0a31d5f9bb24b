//! End-to-end tests for the job lifecycle: upload, progress stream, download
//! and cleanup, driven through the full router with real PDF and DOCX files.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docbridge_core::docx::DocxBuilder;
use docbridge_core::engine::TextFlowConverter;
use docbridge_core::pdf::{self, TextPageLayout};
use docbridge_core::{ConversionKind, DocumentConverter, DocumentError};
use docbridge_server::jobs::JobId;
use docbridge_server::{create_app, AppState};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

const BOUNDARY: &str = "docbridge-test-boundary";

/// Wraps the text-flow converter with a pause per page so a client can
/// connect (and leave) while the job is still running.
struct SlowConverter(Duration);

impl DocumentConverter for SlowConverter {
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        on_page: &mut dyn FnMut(usize) -> ControlFlow<()>,
    ) -> Result<(), DocumentError> {
        TextFlowConverter.convert(input, output, &mut |page| {
            std::thread::sleep(self.0);
            on_page(page)
        })
    }

    fn name(&self) -> &str {
        "slow"
    }
}

fn app(state: &Arc<AppState>) -> Router {
    create_app(Arc::clone(state))
}

fn pdf_bytes(dir: &Path, pages: usize) -> Vec<u8> {
    let path = dir.join(format!("fixture-{pages}.pdf"));
    let content: Vec<Vec<String>> = (1..=pages)
        .map(|i| vec![format!("Section {i}"), format!("Paragraph on page {i}")])
        .collect();
    pdf::write_text_pages(&path, &content, &TextPageLayout::default()).unwrap();
    std::fs::read(&path).unwrap()
}

fn docx_bytes(dir: &Path) -> Vec<u8> {
    let path = dir.join("fixture.docx");
    let mut builder = DocxBuilder::new();
    builder.paragraph("Dear reader,").page_break().paragraph("Regards");
    builder.write(&path).unwrap();
    std::fs::read(&path).unwrap()
}

fn multipart_body(filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post_file(app: Router, uri: &str, filename: &str, bytes: &[u8]) -> axum::response::Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(filename, bytes)))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

async fn submit(state: &Arc<AppState>, uri: &str, filename: &str, bytes: &[u8]) -> JobId {
    let response = post_file(app(state), uri, filename, bytes).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    json["job_id"].as_str().unwrap().parse().unwrap()
}

/// Payloads of every SSE `data:` line, in order.
fn data_lines(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect()
}

fn statuses(events: &[serde_json::Value]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| event["status"].as_str().map(str::to_string))
        .collect()
}

async fn wait_until_empty(state: &AppState, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if state.registry.is_empty() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    state.registry.is_empty()
}

#[tokio::test]
async fn test_pdf_job_reports_every_page_then_done() {
    let fixtures = tempfile::tempdir().unwrap();
    for pages in [1, 5, 50] {
        let work = tempfile::tempdir().unwrap();
        let state = AppState::builder(work.path())
            .retention(Duration::from_secs(5))
            .build();

        let id = submit(&state, "/jobs/pdf-to-word", "report.pdf", &pdf_bytes(fixtures.path(), pages)).await;
        let body = body_text(get(app(&state), &format!("/progress/{id}")).await).await;
        let events = data_lines(&body);
        let statuses = statuses(&events);

        assert!(events.iter().all(|e| e.get("error").is_none()), "{events:?}");
        let total = if pages == 1 {
            "PDF has 1 page".to_string()
        } else {
            format!("PDF has {pages} pages")
        };
        assert_eq!(statuses[0], total);
        let page_events: Vec<&String> = statuses
            .iter()
            .filter(|s| s.starts_with("Converting page "))
            .collect();
        assert_eq!(page_events.len(), pages);
        assert_eq!(*page_events[0], format!("Converting page 1/{pages}"));
        assert_eq!(*page_events[pages - 1], format!("Converting page {pages}/{pages}"));
        assert_eq!(statuses.last().unwrap(), "DONE");
        assert_eq!(statuses[statuses.len() - 2], "Saving document");
    }
}

#[tokio::test]
async fn test_download_serves_docx_then_cleans_up() {
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path())
        .retention(Duration::from_millis(500))
        .build();

    let id = submit(&state, "/jobs/pdf-to-word", "季度报告.pdf", &pdf_bytes(fixtures.path(), 2)).await;
    let body = body_text(get(app(&state), &format!("/progress/{id}")).await).await;
    assert_eq!(statuses(&data_lines(&body)).last().unwrap(), "DONE");

    let response = get(app(&state), &format!("/download/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        ConversionKind::PdfToWord.output_mime()
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("filename*=UTF-8''"), "{disposition}");
    assert!(disposition.contains(".docx"), "{disposition}");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..2], b"PK");

    // Source went right after conversion; output and entry go after retention.
    assert!(wait_until_empty(&state, Duration::from_secs(3)).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);

    let response = get(app(&state), &format!("/download/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_word_job_produces_pdf() {
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path()).build();

    let id = submit(&state, "/jobs/word-to-pdf", "letter.docx", &docx_bytes(fixtures.path())).await;
    let body = body_text(get(app(&state), &format!("/progress/{id}")).await).await;
    assert_eq!(
        statuses(&data_lines(&body)),
        vec!["Rendering PDF".to_string(), "DONE".to_string()]
    );

    let response = get(app(&state), &format!("/download/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_download_before_done_is_rejected() {
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path()).build();
    let id = state.registry.create_job(ConversionKind::PdfToWord);

    let response = get(app(&state), &format!("/download/{id}")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["error"], "File is not ready yet");

    let response = get(app(&state), &format!("/download/{}", JobId::new())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rejected_upload_creates_no_job_and_no_file() {
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path()).build();

    let response = post_file(app(&state), "/jobs/pdf-to-word", "notes.txt", b"hello").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["error"], "Unsupported file type: notes.txt");

    let response = post_file(app(&state), "/jobs/pdf-to-word", "letter.docx", b"PK").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(state.registry.is_empty());
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path()).max_upload_bytes(1024).build();

    let response = post_file(app(&state), "/jobs/pdf-to-word", "big.pdf", &vec![b'x'; 8 * 1024]).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(state.registry.is_empty());
}

#[tokio::test]
async fn test_invalid_pdf_reports_error_event() {
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path())
        .retention(Duration::from_millis(200))
        .build();

    let id = submit(&state, "/jobs/pdf-to-word", "broken.pdf", b"not a pdf at all").await;
    let body = body_text(get(app(&state), &format!("/progress/{id}")).await).await;
    let events = data_lines(&body);

    assert_eq!(events.len(), 1);
    let message = events[0]["error"].as_str().unwrap();
    assert!(message.starts_with("Conversion failed: "), "{message}");

    let response = get(app(&state), &format!("/download/{id}")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(wait_until_empty(&state, Duration::from_secs(3)).await);
}

#[tokio::test]
async fn test_client_disconnect_does_not_stop_job() {
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path())
        .converter(Arc::new(SlowConverter(Duration::from_millis(150))))
        .retention(Duration::from_millis(200))
        .build();

    let id = submit(&state, "/jobs/pdf-to-word", "slow.pdf", &pdf_bytes(fixtures.path(), 3)).await;

    let response = get(app(&state), &format!("/progress/{id}")).await;
    let mut body = response.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let first = String::from_utf8_lossy(frame.data_ref().unwrap()).into_owned();
    assert!(first.contains("PDF has 3 pages"), "{first}");
    drop(body);

    // The job keeps running without a listener and still cleans up.
    assert!(state.registry.contains(&id));
    assert!(wait_until_empty(&state, Duration::from_secs(5)).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_inline_conversion_returns_attachment() {
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path()).build();

    let response = post_file(
        app(&state),
        "/convert/pdf-to-word",
        "minutes.pdf",
        &pdf_bytes(fixtures.path(), 3),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("filename=\"minutes.docx\""), "{disposition}");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..2], b"PK");

    assert!(state.registry.is_empty());
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_inline_failure_returns_500_and_cleans_up() {
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path()).build();

    let response = post_file(app(&state), "/convert/pdf-to-word", "broken.pdf", b"not a pdf").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    let message = json["error"].as_str().unwrap();
    assert!(message.starts_with("Conversion failed: "), "{message}");

    assert!(state.registry.is_empty());
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_inline_word_to_pdf_returns_pdf_attachment() {
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path()).build();

    let response = post_file(
        app(&state),
        "/convert/word-to-pdf",
        "x.docx",
        &docx_bytes(fixtures.path()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("filename=\"x.pdf\""), "{disposition}");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_doc_upload_rejected_by_native_renderer() {
    let work = tempfile::tempdir().unwrap();
    let state = AppState::builder(work.path()).build();

    for uri in ["/convert/word-to-pdf", "/jobs/word-to-pdf"] {
        let response = post_file(app(&state), uri, "legacy.doc", b"\xd0\xcf\x11\xe0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error"], "Unsupported file type: legacy.doc");
    }

    assert!(state.registry.is_empty());
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}
