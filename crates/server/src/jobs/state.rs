// crates/server/src/jobs/state.rs
//! Per-job event channel.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use docbridge_core::ConversionKind;
use tokio::sync::{mpsc, Mutex};

use super::types::{JobResult, ProgressEvent};

/// Why [`EventChannel::poll`] returned without an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("no event within the timeout")]
    TimedOut,
    #[error("event channel closed")]
    Closed,
}

/// FIFO of progress events for one job, plus a one-shot result slot.
///
/// Single producer (the worker, via the registry) and single consumer (the
/// SSE stream). `push` never blocks. A second concurrent consumer waits for
/// the first to finish polling rather than stealing events.
pub struct EventChannel {
    kind: ConversionKind,
    created_at: DateTime<Utc>,
    tx: mpsc::UnboundedSender<ProgressEvent>,
    rx: Mutex<mpsc::UnboundedReceiver<ProgressEvent>>,
    result: OnceLock<JobResult>,
}

impl EventChannel {
    pub fn new(kind: ConversionKind) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            kind,
            created_at: Utc::now(),
            tx,
            rx: Mutex::new(rx),
            result: OnceLock::new(),
        }
    }

    pub fn kind(&self) -> ConversionKind {
        self.kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Enqueue an event. `ResultReady` also fills the result slot.
    pub fn push(&self, event: ProgressEvent) {
        if let ProgressEvent::ResultReady(result) = &event {
            if self.result.set(result.clone()).is_err() {
                tracing::warn!(path = %result.path.display(), "Result slot already filled, keeping the first result");
            }
        }
        // The receiver lives as long as `self`, so sending cannot fail.
        let _ = self.tx.send(event);
    }

    /// Next event in publish order, waiting at most `timeout`.
    pub async fn poll(&self, timeout: Duration) -> Result<ProgressEvent, PollError> {
        let mut rx = self.rx.lock().await;
        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(PollError::Closed),
            Err(_) => Err(PollError::TimedOut),
        }
    }

    /// The finished artifact, once `ResultReady` has been pushed. Does not
    /// consume anything from the queue.
    pub fn result(&self) -> Option<&JobResult> {
        self.result.get()
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("kind", &self.kind)
            .field("created_at", &self.created_at)
            .field("result", &self.result.get())
            .finish_non_exhaustive()
    }
}
