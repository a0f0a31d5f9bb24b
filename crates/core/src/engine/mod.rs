// crates/core/src/engine/mod.rs
//! Conversion engines.
//!
//! Provides the `DocumentConverter` (PDF → DOCX) and `PdfRenderer`
//! (DOCX/DOC → PDF) traits, a native text-flow implementation of each, and a
//! LibreOffice-backed renderer.

pub mod config;
pub mod factory;
pub mod soffice;
pub mod text_flow;
pub mod traits;

pub use config::{RendererConfig, RendererKind};
pub use factory::create_renderer;
pub use soffice::SofficeRenderer;
pub use text_flow::{TextFlowConverter, TextFlowRenderer};
pub use traits::{DocumentConverter, PdfRenderer};
