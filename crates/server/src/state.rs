// crates/server/src/state.rs
//! Application state for the Axum server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docbridge_core::docx::NormalizeOptions;
use docbridge_core::engine::{create_renderer, TextFlowConverter};
use docbridge_core::files::RemovePolicy;
use docbridge_core::{DocumentConverter, PdfRenderer};

use crate::config::ServerConfig;
use crate::jobs::{JobRegistry, Worker, WorkerSettings};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Live conversion jobs and their event channels.
    pub registry: Arc<JobRegistry>,
    /// Spawns conversion jobs; also holds the engines used inline.
    pub worker: Worker,
    /// Uploads and converted files live here.
    pub work_dir: PathBuf,
    /// Idle time before a progress stream emits a heartbeat.
    pub heartbeat: Duration,
    pub max_upload_bytes: usize,
    pub remove_policy: RemovePolicy,
}

impl AppState {
    /// Build state from configuration with the default engines.
    pub fn from_config(config: &ServerConfig) -> Arc<Self> {
        Self::builder(config.work_dir.clone())
            .heartbeat(config.heartbeat())
            .retention(config.retention())
            .max_upload_bytes(config.max_upload_bytes())
            .renderer(create_renderer(&config.renderer_config()))
            .build()
    }

    pub fn builder(work_dir: impl Into<PathBuf>) -> AppStateBuilder {
        AppStateBuilder::new(work_dir.into())
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Assembles an [`AppState`]; tests use it to swap in fake engines and
/// short timings.
pub struct AppStateBuilder {
    work_dir: PathBuf,
    converter: Arc<dyn DocumentConverter>,
    renderer: Arc<dyn PdfRenderer>,
    settings: WorkerSettings,
    heartbeat: Duration,
    max_upload_bytes: usize,
}

impl AppStateBuilder {
    fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            converter: Arc::new(TextFlowConverter),
            renderer: create_renderer(&Default::default()),
            settings: WorkerSettings::default(),
            heartbeat: Duration::from_secs(30),
            max_upload_bytes: docbridge_core::MAX_UPLOAD_BYTES,
        }
    }

    pub fn converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    pub fn retention(mut self, retention: Duration) -> Self {
        self.settings.retention = retention;
        self
    }

    pub fn normalize(mut self, options: NormalizeOptions) -> Self {
        self.settings.normalize = options;
        self
    }

    pub fn remove_policy(mut self, policy: RemovePolicy) -> Self {
        self.settings.remove_policy = policy;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn build(self) -> Arc<AppState> {
        let registry = Arc::new(JobRegistry::new());
        let remove_policy = self.settings.remove_policy;
        let worker = Worker::new(
            Arc::clone(&registry),
            self.converter,
            self.renderer,
            self.settings,
        );
        Arc::new(AppState {
            start_time: Instant::now(),
            registry,
            worker,
            work_dir: self.work_dir,
            heartbeat: self.heartbeat,
            max_upload_bytes: self.max_upload_bytes,
            remove_policy,
        })
    }
}
