// crates/observability/src/lib.rs
//! Tracing setup for the docbridge binary.
//!
//! One call to [`init_tracing`] installs a global subscriber: an `EnvFilter`
//! (honouring `RUST_LOG`), a stderr fmt layer in compact or JSON form, and an
//! optional daily-rolling log file.

use std::path::PathBuf;
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,docbridge_server=info,docbridge_core=info,tower_http=info";

/// File name prefix for rolling log files (`docbridge.log.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "docbridge.log";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected 'compact' or 'json')")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Also write logs to a daily-rolling file in this directory.
    pub log_dir: Option<PathBuf>,
    /// Overrides `RUST_LOG` and [`DEFAULT_FILTER`] when set.
    pub filter: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("A global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Keeps the background file writer alive; flushes on drop.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LogGuard {
    file: Option<WorkerGuard>,
}

impl LogGuard {
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }
}

/// Build the env filter: explicit filter, then `RUST_LOG`, then the default.
pub fn build_filter(explicit: Option<&str>) -> Result<EnvFilter, InitError> {
    match explicit {
        Some(directives) => {
            EnvFilter::try_new(directives).map_err(|e| InitError::Filter(e.to_string()))
        }
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())),
    }
}

/// Install the global subscriber described by `config`.
pub fn init_tracing(config: &LogConfig) -> Result<LogGuard, InitError> {
    let filter = build_filter(config.filter.as_deref())?;

    let (file_writer, file_guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| InitError::LogDir {
                path: dir.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let compact = (config.format == LogFormat::Compact)
        .then(|| fmt::layer().compact().with_target(true));
    let json = (config.format == LogFormat::Json).then(|| fmt::layer().json().with_target(true));
    // Files always get JSON lines, whatever the console format.
    let file = file_writer.map(|writer| fmt::layer().json().with_ansi(false).with_writer(writer));

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .with(file)
        .try_init()
        .map_err(|e| InitError::AlreadyInstalled(e.to_string()))?;

    Ok(LogGuard { file: file_guard })
}
