// crates/core/src/docx/reader.rs
//! Reading paragraph text out of a `.docx` package.

use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::DOCUMENT_PART;
use crate::error::DocumentError;

/// A block-level item of a document body, as far as text layout cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(String),
    PageBreak,
}

/// Load `word/document.xml` from the package at `path`.
pub fn document_xml(path: &Path) -> Result<String, DocumentError> {
    let file = std::fs::File::open(path).map_err(|e| DocumentError::io(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| DocumentError::package(path, e))?;
    let mut part = match archive.by_name(DOCUMENT_PART) {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(DocumentError::MissingPart {
                path: path.to_path_buf(),
                part: DOCUMENT_PART.to_string(),
            })
        }
        Err(e) => return Err(DocumentError::package(path, e)),
    };
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| DocumentError::io(path, e))?;
    Ok(xml)
}

/// Paragraphs and explicit page breaks of the document at `path`, in order.
pub fn read_blocks(path: &Path) -> Result<Vec<Block>, DocumentError> {
    let xml = document_xml(path)?;
    parse_blocks(&xml).map_err(|e| DocumentError::xml(path, e))
}

fn parse_blocks(xml: &str) -> Result<Vec<Block>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut blocks = Vec::new();
    // Innermost paragraph last; text boxes nest paragraphs inside runs.
    let mut open: Vec<OpenParagraph> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(OpenParagraph::default()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    if let Some(p) = open.pop() {
                        // A paragraph that only carried a page break adds nothing.
                        if !p.text.is_empty() || !p.broke {
                            blocks.push(Block::Paragraph(p.text));
                        }
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => blocks.push(Block::Paragraph(String::new())),
                b"w:tab" => {
                    if let Some(p) = open.last_mut() {
                        p.text.push('\t');
                    }
                }
                b"w:br" if is_page_break(&e) => {
                    // Text before the break stays on the earlier page.
                    if let Some(p) = open.last_mut() {
                        if !p.text.is_empty() {
                            blocks.push(Block::Paragraph(std::mem::take(&mut p.text)));
                        }
                        p.broke = true;
                    }
                    blocks.push(Block::PageBreak);
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(p) = open.last_mut() {
                    p.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) if in_text => {
                if let Some(p) = open.last_mut() {
                    p.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(blocks)
}

#[derive(Default)]
struct OpenParagraph {
    text: String,
    broke: bool,
}

fn is_page_break(e: &BytesStart<'_>) -> bool {
    e.try_get_attribute("w:type")
        .ok()
        .flatten()
        .is_some_and(|a| a.value.as_ref() == b"page")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::DocxBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_through_builder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.docx");
        DocxBuilder::new()
            .paragraph("First")
            .paragraph("")
            .page_break()
            .paragraph("Second & last")
            .write(&path)
            .unwrap();

        assert_eq!(
            read_blocks(&path).unwrap(),
            vec![
                Block::Paragraph("First".into()),
                Block::Paragraph(String::new()),
                Block::PageBreak,
                Block::Paragraph("Second & last".into()),
            ]
        );
    }

    #[test]
    fn test_break_inside_paragraph_splits_text() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
            <w:p><w:r><w:t>before</w:t><w:br w:type="page"/><w:t>after</w:t></w:r></w:p>
            </w:body></w:document>"#;
        assert_eq!(
            parse_blocks(xml).unwrap(),
            vec![
                Block::Paragraph("before".into()),
                Block::PageBreak,
                Block::Paragraph("after".into()),
            ]
        );
    }

    #[test]
    fn test_runs_and_tabs_are_joined() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
            <w:p><w:r><w:t>a</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve">b c</w:t></w:r></w:p>
            <w:p><w:r><w:br/><w:t>line</w:t></w:r></w:p>
            </w:body></w:document>"#;
        assert_eq!(
            parse_blocks(xml).unwrap(),
            vec![
                Block::Paragraph("a\tb c".into()),
                Block::Paragraph("line".into()),
            ]
        );
    }

    #[test]
    fn test_missing_document_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.docx");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.finish().unwrap();

        assert!(matches!(
            read_blocks(&path).unwrap_err(),
            DocumentError::MissingPart { .. }
        ));
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(matches!(
            read_blocks(&path).unwrap_err(),
            DocumentError::Package { .. }
        ));
    }
}
