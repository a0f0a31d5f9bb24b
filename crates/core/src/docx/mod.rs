// crates/core/src/docx/mod.rs
//! Minimal WordprocessingML support.
//!
//! Enough of the OOXML package format to write text documents, read their
//! paragraphs back, and rewrite paragraph spacing in place. Formatting runs,
//! tables, and images are passed through untouched by the normalizer and
//! ignored by the reader.

pub mod normalize;
pub mod package;
pub mod reader;

pub use normalize::{normalize_paragraph_spacing, NormalizeOptions, ParagraphFormat};
pub use package::DocxBuilder;
pub use reader::{read_blocks, Block};

/// Main document part inside the package.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// WordprocessingML main namespace.
pub(crate) const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Split blocks into pages at explicit page breaks.
///
/// Always yields at least one page, possibly empty.
pub fn paginate(blocks: &[Block]) -> Vec<Vec<String>> {
    let mut pages = vec![Vec::new()];
    for block in blocks {
        match block {
            Block::Paragraph(text) => {
                if let Some(page) = pages.last_mut() {
                    page.push(text.clone());
                }
            }
            Block::PageBreak => pages.push(Vec::new()),
        }
    }
    pages
}
