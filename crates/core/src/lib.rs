// crates/core/src/lib.rs
pub mod docx;
pub mod engine;
pub mod error;
pub mod files;
pub mod pdf;
pub mod types;
pub mod upload;

pub use engine::{DocumentConverter, PdfRenderer};
pub use error::*;
pub use types::*;
pub use upload::*;
