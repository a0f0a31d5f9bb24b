// crates/server/src/jobs/worker.rs
//! Conversion worker: one spawned task per accepted job.
//!
//! The worker is the only producer for its job's channel. It reports page
//! progress, runs the formatting pass, publishes the result, and then owns
//! cleanup: the source file right away, the output file and the registry
//! entry after the retention period.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use docbridge_core::docx::{normalize_paragraph_spacing, NormalizeOptions};
use docbridge_core::files::{remove_with_retry, RemovePolicy};
use docbridge_core::{pdf, ConversionKind, DocumentConverter, PdfRenderer};
use tokio::task::JoinHandle;

use super::runner::JobRegistry;
use super::types::{JobId, JobResult, ProgressEvent};
use crate::error::ConversionError;

/// Tunables shared by every worker.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// How long a finished (or failed) job stays downloadable.
    pub retention: Duration,
    pub normalize: NormalizeOptions,
    pub remove_policy: RemovePolicy,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(5),
            normalize: NormalizeOptions::default(),
            remove_policy: RemovePolicy::default(),
        }
    }
}

/// Everything a worker needs to know about one job.
#[derive(Debug, Clone)]
pub struct ConversionTask {
    pub job_id: JobId,
    pub kind: ConversionKind,
    pub source: PathBuf,
    pub output: PathBuf,
    pub original_name: String,
}

/// Engines plus the registry, cloned into each spawned job.
#[derive(Clone)]
pub struct Worker {
    registry: Arc<JobRegistry>,
    converter: Arc<dyn DocumentConverter>,
    renderer: Arc<dyn PdfRenderer>,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(
        registry: Arc<JobRegistry>,
        converter: Arc<dyn DocumentConverter>,
        renderer: Arc<dyn PdfRenderer>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            registry,
            converter,
            renderer,
            settings,
        }
    }

    pub fn converter(&self) -> &Arc<dyn DocumentConverter> {
        &self.converter
    }

    pub fn renderer(&self) -> &Arc<dyn PdfRenderer> {
        &self.renderer
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Start the job in the background. The caller must have created
    /// `task.job_id` in the registry and must not spawn it twice.
    pub fn spawn(&self, task: ConversionTask) -> JoinHandle<()> {
        let worker = self.clone();
        tokio::spawn(async move { worker.run(task).await })
    }

    async fn run(self, task: ConversionTask) {
        let id = task.job_id;
        tracing::info!(job_id = %id, kind = %task.kind, file = %task.original_name, "Conversion started");

        let outcome = match task.kind {
            ConversionKind::PdfToWord => self.pdf_to_word(&task).await,
            ConversionKind::WordToPdf => self.word_to_pdf(&task).await,
        };
        remove_with_retry(&task.source, self.settings.remove_policy).await;

        match outcome {
            Ok(()) => {
                self.publish(
                    &id,
                    ProgressEvent::ResultReady(JobResult {
                        path: task.output.clone(),
                        original_name: task.original_name.clone(),
                        kind: task.kind,
                    }),
                );
                self.publish(&id, ProgressEvent::Done);
                tracing::info!(job_id = %id, output = %task.output.display(), "Conversion finished");
            }
            Err(err) => {
                tracing::warn!(job_id = %id, error = %err, "Conversion failed");
                self.publish(&id, ProgressEvent::Error(format!("Conversion failed: {err}")));
            }
        }

        tokio::time::sleep(self.settings.retention).await;
        remove_with_retry(&task.output, self.settings.remove_policy).await;
        self.registry.delete(&id);
        tracing::debug!(job_id = %id, "Job cleaned up");
    }

    async fn pdf_to_word(&self, task: &ConversionTask) -> Result<(), ConversionError> {
        let id = task.job_id;

        let source = task.source.clone();
        let total = blocking(move || pdf::page_count(&source)).await?;
        self.publish(&id, ProgressEvent::info(page_total_message(total)));

        let converter = Arc::clone(&self.converter);
        let registry = Arc::clone(&self.registry);
        let (source, output) = (task.source.clone(), task.output.clone());
        blocking(move || {
            converter.convert(&source, &output, &mut |page| {
                registry.publish(&id, ProgressEvent::info(format!("Converting page {page}/{total}")));
                ControlFlow::Continue(())
            })
        })
        .await?;

        self.publish(&id, ProgressEvent::info("Formatting document"));
        let registry = Arc::clone(&self.registry);
        let options = self.settings.normalize;
        let output = task.output.clone();
        blocking(move || {
            normalize_paragraph_spacing(&output, &options, |done, total| {
                registry.publish(
                    &id,
                    ProgressEvent::info(format!("Formatting paragraphs ({done}/{total})")),
                );
            })
        })
        .await?;
        self.publish(&id, ProgressEvent::info("Saving document"));
        Ok(())
    }

    async fn word_to_pdf(&self, task: &ConversionTask) -> Result<(), ConversionError> {
        self.publish(&task.job_id, ProgressEvent::info("Rendering PDF"));
        let renderer = Arc::clone(&self.renderer);
        let (source, output) = (task.source.clone(), task.output.clone());
        blocking(move || renderer.render(&source, &output)).await
    }

    fn publish(&self, id: &JobId, event: ProgressEvent) {
        self.registry.publish(id, event);
    }
}

fn page_total_message(total: usize) -> String {
    match total {
        1 => "PDF has 1 page".to_string(),
        n => format!("PDF has {n} pages"),
    }
}

/// Run engine work on the blocking pool. A panic becomes an error.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ConversionError>
where
    F: FnOnce() -> Result<T, docbridge_core::DocumentError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// Convert or render `source` into `output` without a job: used by the
/// inline routes. Runs the same formatting pass as jobs, without progress.
pub async fn convert_inline(
    worker: &Worker,
    kind: ConversionKind,
    source: &Path,
    output: &Path,
) -> Result<(), ConversionError> {
    let (source, output) = (source.to_path_buf(), output.to_path_buf());
    match kind {
        ConversionKind::PdfToWord => {
            let converter = Arc::clone(&worker.converter);
            let options = worker.settings.normalize;
            blocking(move || {
                converter.convert(&source, &output, &mut |_| ControlFlow::Continue(()))?;
                normalize_paragraph_spacing(&output, &options, |_, _| {})?;
                Ok(())
            })
            .await
        }
        ConversionKind::WordToPdf => {
            let renderer = Arc::clone(&worker.renderer);
            blocking(move || renderer.render(&source, &output)).await
        }
    }
}
