// crates/core/src/engine/factory.rs
//! Renderer factory: creates a `PdfRenderer` from configuration.

use std::sync::Arc;

use super::config::{RendererConfig, RendererKind};
use super::soffice::SofficeRenderer;
use super::text_flow::TextFlowRenderer;
use super::traits::PdfRenderer;

/// Create the renderer selected by `config`.
///
/// The soffice binary is not probed here; a missing install surfaces as a
/// `ToolUnavailable` error on the first render.
pub fn create_renderer(config: &RendererConfig) -> Arc<dyn PdfRenderer> {
    match config.kind {
        RendererKind::Native => Arc::new(TextFlowRenderer::default()),
        RendererKind::Soffice => Arc::new(SofficeRenderer::new(&config.soffice_bin)),
    }
}
