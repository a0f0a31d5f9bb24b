// crates/server/src/jobs/mod.rs
//! Background conversion jobs.
//!
//! Provides:
//! - `JobRegistry`: process-wide map of job id to event channel
//! - `EventChannel`: per-job FIFO of progress events plus the result slot
//! - `Worker`: spawns one conversion task per job and cleans up after it

pub mod runner;
pub mod state;
pub mod types;
pub mod worker;

pub use runner::JobRegistry;
pub use state::{EventChannel, PollError};
pub use types::{JobId, JobResult, ProgressEvent, WireMessage};
pub use worker::{convert_inline, ConversionTask, Worker, WorkerSettings};
