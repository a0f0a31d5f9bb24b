// crates/server/src/config.rs
//! Server configuration: command-line flags with environment fallbacks.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use docbridge_core::engine::{RendererConfig, RendererKind};
use docbridge_observability::{LogConfig, LogFormat};

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, Parser)]
#[command(name = "docbridge")]
#[command(about = "PDF and Word conversion service with live progress")]
#[command(version)]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "DOCBRIDGE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind; falls back to `PORT`, then 5000.
    #[arg(long, env = "DOCBRIDGE_PORT")]
    pub port: Option<u16>,

    /// Directory for uploads and converted files. Purged at startup.
    #[arg(long, env = "DOCBRIDGE_WORK_DIR", default_value = "uploads")]
    pub work_dir: PathBuf,

    /// Largest accepted upload, in MiB.
    #[arg(long, env = "DOCBRIDGE_MAX_UPLOAD_MB", default_value_t = 16)]
    pub max_upload_mb: usize,

    /// Idle time before a progress stream sends a heartbeat.
    #[arg(long, env = "DOCBRIDGE_HEARTBEAT_SECS", default_value_t = 30)]
    pub heartbeat_secs: u64,

    /// How long a finished result stays downloadable.
    #[arg(long, env = "DOCBRIDGE_RESULT_RETENTION_SECS", default_value_t = 5)]
    pub result_retention_secs: u64,

    /// Word → PDF renderer: `native` or `soffice`.
    #[arg(long, env = "DOCBRIDGE_RENDERER", default_value = "native")]
    pub renderer: RendererKind,

    /// LibreOffice executable for the `soffice` renderer.
    #[arg(long, env = "DOCBRIDGE_SOFFICE_BIN", default_value = "soffice")]
    pub soffice_bin: PathBuf,

    /// Console log format: `compact` or `json`.
    #[arg(long, env = "DOCBRIDGE_LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Also write daily-rolling JSON logs here.
    #[arg(long, env = "DOCBRIDGE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: None,
            work_dir: PathBuf::from("uploads"),
            max_upload_mb: 16,
            heartbeat_secs: 30,
            result_retention_secs: 5,
            renderer: RendererKind::Native,
            soffice_bin: PathBuf::from("soffice"),
            log_format: LogFormat::Compact,
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Explicit `--port`/`DOCBRIDGE_PORT`, then `PORT`, then the default.
    pub fn port(&self) -> u16 {
        self.port
            .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port());
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address {addr}: {e}"))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.result_retention_secs)
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            kind: self.renderer,
            soffice_bin: self.soffice_bin.clone(),
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            format: self.log_format,
            log_dir: self.log_dir.clone(),
            filter: None,
        }
    }
}
