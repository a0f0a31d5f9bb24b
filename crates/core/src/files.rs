// crates/core/src/files.rs
//! Temporary file handling inside the work directory.
//!
//! Removal is best-effort: the OS may briefly keep a handle open (virus
//! scanners, a write that just closed), so deletion is retried with
//! exponential backoff and then abandoned with a log line. Callers are never
//! handed the error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use uuid::Uuid;

/// A fresh `<uuid>.<extension>` path inside `dir`.
pub fn unique_path(dir: &Path, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", Uuid::new_v4(), extension))
}

/// Same stem as `path`, different extension.
pub fn sibling_with_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

/// Retry schedule for [`remove_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovePolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RemovePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RemovePolicy {
    /// Delay before attempt `attempt + 1` (attempts are 1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// How a removal ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed { attempts: u32 },
    /// Nothing to delete.
    Missing,
    /// Every attempt failed; the file is left behind.
    Abandoned { attempts: u32, last_error: String },
}

/// Delete `path`, retrying per `policy`. Never returns an error.
pub async fn remove_with_retry(path: &Path, policy: RemovePolicy) -> RemoveOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), attempt, "Removed temp file");
                return RemoveOutcome::Removed { attempts: attempt };
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return if attempt == 1 {
                    RemoveOutcome::Missing
                } else {
                    RemoveOutcome::Removed { attempts: attempt }
                };
            }
            Err(e) if attempt >= max_attempts => {
                tracing::warn!(
                    path = %path.display(),
                    attempts = attempt,
                    error = %e,
                    "Giving up on temp file removal"
                );
                return RemoveOutcome::Abandoned {
                    attempts: attempt,
                    last_error: e.to_string(),
                };
            }
            Err(e) => {
                let delay = policy.backoff_after(attempt);
                tracing::debug!(
                    path = %path.display(),
                    attempt,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Temp file still busy, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Result of clearing the work directory at startup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Create `dir` if needed and delete every regular file directly inside it.
///
/// Subdirectories are left alone. Per-file failures are collected, not raised.
pub fn prepare_work_dir(dir: &Path) -> std::io::Result<PurgeReport> {
    std::fs::create_dir_all(dir)?;

    let mut report = PurgeReport::default();
    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Removed leftover temp file");
                report.removed.push(path);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove leftover temp file");
                report.failed.push((path, e.to_string()));
            }
        }
    }
    Ok(report)
}
