// crates/core/src/engine/text_flow.rs
//! Native engines that move plain text between PDF and DOCX.
//!
//! Layout is not preserved: each PDF text line becomes one paragraph, and
//! each source page boundary becomes an explicit page break. Rendering back
//! wraps paragraphs into fixed-width lines on Letter pages.

use std::ops::ControlFlow;
use std::path::Path;

use super::traits::{DocumentConverter, PdfRenderer};
use crate::docx::{self, DocxBuilder};
use crate::error::DocumentError;
use crate::pdf::{self, TextPageLayout};

/// PDF → DOCX via `lopdf` text extraction.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFlowConverter;

impl DocumentConverter for TextFlowConverter {
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        on_page: &mut dyn FnMut(usize) -> ControlFlow<()>,
    ) -> Result<(), DocumentError> {
        let doc = pdf::load(input)?;
        let pages = doc.get_pages();
        let mut builder = DocxBuilder::new();

        for (index, &number) in pages.keys().enumerate() {
            let page = index + 1;
            if index > 0 {
                builder.page_break();
            }
            let lines = pdf::page_lines(&doc, input, number)?;
            if lines.is_empty() {
                builder.paragraph("");
            }
            for line in lines {
                builder.paragraph(line);
            }
            if on_page(page).is_break() {
                return Err(DocumentError::Aborted { page });
            }
        }

        builder.write(output)?;
        tracing::debug!(
            input = %input.display(),
            pages = pages.len(),
            paragraphs = builder.paragraph_count(),
            "Text-flow conversion finished"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "text-flow"
    }
}

/// DOCX → PDF via `lopdf`, one text line per wrapped paragraph line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFlowRenderer {
    layout: TextPageLayout,
}

impl TextFlowRenderer {
    /// Flow logical pages (split at explicit breaks) onto physical pages.
    fn lay_out(&self, logical_pages: Vec<Vec<String>>) -> Vec<Vec<String>> {
        let per_page = self.layout.lines_per_page();
        let width = self.layout.chars_per_line();
        let mut physical = Vec::new();

        for paragraphs in logical_pages {
            let mut current: Vec<String> = Vec::new();
            for paragraph in paragraphs {
                for line in wrap(&paragraph, width) {
                    if current.len() == per_page {
                        physical.push(std::mem::take(&mut current));
                    }
                    current.push(line);
                }
            }
            physical.push(current);
        }
        physical
    }
}

impl PdfRenderer for TextFlowRenderer {
    fn render(&self, input: &Path, output: &Path) -> Result<(), DocumentError> {
        let extension = input
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !self.accepts(&extension) {
            return Err(DocumentError::unsupported(
                input,
                "the native renderer only reads .docx; configure the soffice renderer for .doc",
            ));
        }

        let blocks = docx::read_blocks(input)?;
        let pages = self.lay_out(docx::paginate(&blocks));
        pdf::write_text_pages(output, &pages, &self.layout)?;
        tracing::debug!(input = %input.display(), pages = pages.len(), "Text-flow render finished");
        Ok(())
    }

    fn accepts(&self, extension: &str) -> bool {
        extension == "docx"
    }

    fn name(&self) -> &str {
        "text-flow"
    }
}

/// Greedy word wrap at `width` characters. Overlong words are split.
/// An empty paragraph yields one empty line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}
