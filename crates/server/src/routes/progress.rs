// crates/server/src/routes/progress.rs
//! Live progress for one job over Server-Sent Events.
//!
//! - GET /progress/{job_id}
//!
//! | `data:` payload            | When                                  |
//! |----------------------------|---------------------------------------|
//! | `{"status": "<message>"}`  | Each progress step                    |
//! | `{"status": "heartbeat"}`  | No event within the heartbeat period  |
//! | `{"status": "DONE"}`       | Result ready; stream closes           |
//! | `{"error": "<message>"}`   | Conversion failed, or unknown job     |

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderName;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::jobs::{JobId, PollError, ProgressEvent, WireMessage};
use crate::state::AppState;

fn sse_event(message: &WireMessage) -> Event {
    Event::default().data(serde_json::to_string(message).unwrap_or_default())
}

/// Logs when a stream is dropped before it reached a terminal event, which
/// is how a client disconnect shows up on the server.
struct StreamGuard {
    job_id: String,
    finished: bool,
}

impl StreamGuard {
    fn new(job_id: String) -> Self {
        Self {
            job_id,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if self.finished {
            tracing::debug!(job_id = %self.job_id, "Progress stream closed");
        } else {
            tracing::info!(job_id = %self.job_id, "Progress client disconnected");
        }
    }
}

/// GET /progress/{job_id} - drain the job's events as SSE.
pub async fn stream_progress(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let registry = Arc::clone(&state.registry);
    let heartbeat = state.heartbeat;
    let id = job_id
        .parse::<JobId>()
        .ok()
        .filter(|id| registry.contains(id));

    let stream = async_stream::stream! {
        let mut guard = StreamGuard::new(job_id);

        match id {
            None => {
                yield Ok::<_, Infallible>(sse_event(&WireMessage::error("Invalid job id")));
            }
            Some(id) => loop {
                let Some(channel) = registry.lookup(&id) else {
                    yield Ok(sse_event(&WireMessage::error("Job was removed")));
                    break;
                };
                match channel.poll(heartbeat).await {
                    Ok(ProgressEvent::ResultReady(_)) => continue,
                    Ok(event) => {
                        if let Some(message) = event.to_wire() {
                            yield Ok(sse_event(&message));
                        }
                        if event.is_terminal() {
                            break;
                        }
                    }
                    Err(PollError::TimedOut) => {
                        yield Ok(sse_event(&WireMessage::heartbeat()));
                    }
                    Err(PollError::Closed) => {
                        yield Ok(sse_event(&WireMessage::error("Job was removed")));
                        break;
                    }
                }
            },
        }

        guard.finish();
    };

    (
        [(CACHE_CONTROL, "no-cache"), (HeaderName::from_static("x-accel-buffering"), "no")],
        Sse::new(stream),
    )
}

/// Build the progress router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/progress/{job_id}", get(stream_progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use docbridge_core::ConversionKind;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
        let response = router()
            .with_state(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    /// JSON payloads of every `data:` line, in order.
    fn data_lines(body: &str) -> Vec<serde_json::Value> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .map(|data| serde_json::from_str(data).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_unknown_job_gets_single_error() {
        let state = AppState::builder("/tmp").build();
        let (status, headers, body) =
            get(state.clone(), &format!("/progress/{}", JobId::new())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CACHE_CONTROL], "no-cache");
        assert_eq!(headers["x-accel-buffering"], "no");
        assert_eq!(data_lines(&body), vec![serde_json::json!({"error": "Invalid job id"})]);

        let (_, _, body) = get(state, "/progress/garbage").await;
        assert_eq!(data_lines(&body), vec![serde_json::json!({"error": "Invalid job id"})]);
    }

    #[tokio::test]
    async fn test_forwards_in_order_and_stops_after_done() {
        let state = AppState::builder("/tmp").build();
        let id = state.registry.create_job(ConversionKind::PdfToWord);
        let registry = &state.registry;
        registry.publish(&id, ProgressEvent::info("PDF has 2 pages"));
        registry.publish(&id, ProgressEvent::info("Converting page 1/2"));
        registry.publish(&id, ProgressEvent::info("Converting page 2/2"));
        registry.publish(
            &id,
            ProgressEvent::ResultReady(crate::jobs::JobResult {
                path: "/tmp/x.docx".into(),
                original_name: "x.pdf".into(),
                kind: ConversionKind::PdfToWord,
            }),
        );
        registry.publish(&id, ProgressEvent::Done);
        registry.publish(&id, ProgressEvent::info("never forwarded"));

        let (_, _, body) = get(state.clone(), &format!("/progress/{id}")).await;
        assert_eq!(
            data_lines(&body),
            vec![
                serde_json::json!({"status": "PDF has 2 pages"}),
                serde_json::json!({"status": "Converting page 1/2"}),
                serde_json::json!({"status": "Converting page 2/2"}),
                serde_json::json!({"status": "DONE"}),
            ]
        );
    }

    #[tokio::test]
    async fn test_stops_after_error() {
        let state = AppState::builder("/tmp").build();
        let id = state.registry.create_job(ConversionKind::WordToPdf);
        state.registry.publish(&id, ProgressEvent::Error("Conversion failed: boom".into()));
        state.registry.publish(&id, ProgressEvent::Done);

        let (_, _, body) = get(state, &format!("/progress/{id}")).await;
        assert_eq!(
            data_lines(&body),
            vec![serde_json::json!({"error": "Conversion failed: boom"})]
        );
    }

    #[tokio::test]
    async fn test_heartbeat_then_removed() {
        let state = AppState::builder("/tmp")
            .heartbeat(Duration::from_millis(50))
            .build();
        let id = state.registry.create_job(ConversionKind::PdfToWord);

        let registry = Arc::clone(&state.registry);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            registry.delete(&id);
        });

        let (_, _, body) = get(state, &format!("/progress/{id}")).await;
        let lines = data_lines(&body);
        assert!(lines.len() >= 2);
        assert!(lines[..lines.len() - 1]
            .iter()
            .all(|l| *l == serde_json::json!({"status": "heartbeat"})));
        assert_eq!(lines.last().unwrap(), &serde_json::json!({"error": "Job was removed"}));
    }
}
