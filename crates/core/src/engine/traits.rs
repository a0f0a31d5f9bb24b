// crates/core/src/engine/traits.rs
//! Engine traits.
//!
//! Both traits are blocking; callers in async code run them on the blocking
//! pool.

use std::ops::ControlFlow;
use std::path::Path;

use crate::error::DocumentError;

/// Converts a PDF into a Word document.
pub trait DocumentConverter: Send + Sync {
    /// Convert `input` into a `.docx` at `output`.
    ///
    /// `on_page` is called with the 1-based number of each page once it has
    /// been converted, in page order. Returning `ControlFlow::Break` stops the
    /// conversion with [`DocumentError::Aborted`].
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        on_page: &mut dyn FnMut(usize) -> ControlFlow<()>,
    ) -> Result<(), DocumentError>;

    /// Engine name for logging (e.g. "text-flow").
    fn name(&self) -> &str;
}

/// Renders a Word document to PDF.
pub trait PdfRenderer: Send + Sync {
    /// Render `input` (`.doc` or `.docx`) into a PDF at `output`.
    fn render(&self, input: &Path, output: &Path) -> Result<(), DocumentError>;

    /// Whether the renderer can handle this input extension (lowercase, no dot).
    fn accepts(&self, extension: &str) -> bool;

    /// Engine name for logging (e.g. "soffice").
    fn name(&self) -> &str;
}
