// crates/server/src/jobs/types.rs
//! Types for the conversion job system.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use docbridge_core::{upload, ConversionKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for a conversion job (random UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Where a finished job's artifact lives and what to call it on download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub path: PathBuf,
    pub original_name: String,
    pub kind: ConversionKind,
}

impl JobResult {
    /// Attachment name, e.g. `report.pdf` → `report.docx`.
    pub fn download_name(&self) -> String {
        upload::download_name(&self.original_name, self.kind)
    }
}

/// One entry in a job's event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Info(String),
    Error(String),
    Done,
    /// Internal: the artifact is on disk. Never sent to clients.
    ResultReady(JobResult),
}

impl ProgressEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info(message.into())
    }

    /// `Done` and `Error` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }

    /// SSE payload for this event, or `None` for internal events.
    pub fn to_wire(&self) -> Option<WireMessage> {
        match self {
            Self::Info(message) => Some(WireMessage::status(message.clone())),
            Self::Error(message) => Some(WireMessage::error(message.clone())),
            Self::Done => Some(WireMessage::status("DONE")),
            Self::ResultReady(_) => None,
        }
    }
}

/// JSON body of one SSE `data:` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireMessage {
    Status { status: String },
    Error { error: String },
}

impl WireMessage {
    pub fn status(status: impl Into<String>) -> Self {
        Self::Status {
            status: status.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    pub fn heartbeat() -> Self {
        Self::status("heartbeat")
    }
}
