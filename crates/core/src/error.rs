// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading, converting, or rewriting a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid PDF {path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("Invalid document package {path}: {source}")]
    Package {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Malformed XML in {path}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("Document {path} has no part named {part}")]
    MissingPart { path: PathBuf, part: String },

    #[error("{tool} is not available: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Unsupported input {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error("Conversion aborted after page {page}")]
    Aborted { page: usize },
}

impl DocumentError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    pub fn pdf(path: impl Into<PathBuf>, source: lopdf::Error) -> Self {
        Self::Pdf {
            path: path.into(),
            source,
        }
    }

    pub fn package(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        match source {
            zip::result::ZipError::Io(io) => Self::io(path, io),
            source => Self::Package {
                path: path.into(),
                source,
            },
        }
    }

    pub fn xml(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Xml {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn unsupported(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised when an upload is rejected before any work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("No file selected")]
    EmptyFilename,

    #[error("Unsupported file type: {filename}")]
    UnsupportedExtension { filename: String },
}
