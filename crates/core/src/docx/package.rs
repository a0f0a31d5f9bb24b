// crates/core/src/docx/package.rs
//! Writing minimal `.docx` packages.

use std::io::{Cursor, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::reader::Block;
use super::{DOCUMENT_PART, W_NS};
use crate::error::DocumentError;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Accumulates paragraphs and page breaks, then writes them as a `.docx`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocxBuilder {
    blocks: Vec<Block>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paragraph(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn page_break(&mut self) -> &mut Self {
        self.blocks.push(Block::PageBreak);
        self
    }

    pub fn paragraph_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Paragraph(_)))
            .count()
    }

    /// Write the package to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<(), DocumentError> {
        let document = self.document_xml(path)?;

        let file = std::fs::File::create(path).map_err(|e| DocumentError::io(path, e))?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, &[u8]); 3] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes()),
            (DOCUMENT_PART, &document),
        ];
        for (name, bytes) in parts {
            zip.start_file(name, options)
                .map_err(|e| DocumentError::package(path, e))?;
            zip.write_all(bytes).map_err(|e| DocumentError::io(path, e))?;
        }
        zip.finish().map_err(|e| DocumentError::package(path, e))?;
        Ok(())
    }

    fn document_xml(&self, path: &Path) -> Result<Vec<u8>, DocumentError> {
        let mut out = XmlOut {
            writer: Writer::new(Cursor::new(Vec::new())),
            path,
        };

        out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        out.event(Event::Start(
            BytesStart::new("w:document").with_attributes([("xmlns:w", W_NS)]),
        ))?;
        out.event(Event::Start(BytesStart::new("w:body")))?;

        for block in &self.blocks {
            match block {
                Block::Paragraph(text) => out.paragraph(text)?,
                Block::PageBreak => out.page_break()?,
            }
        }

        out.section_properties()?;
        out.event(Event::End(BytesEnd::new("w:body")))?;
        out.event(Event::End(BytesEnd::new("w:document")))?;
        Ok(out.writer.into_inner().into_inner())
    }
}

struct XmlOut<'p> {
    writer: Writer<Cursor<Vec<u8>>>,
    path: &'p Path,
}

impl XmlOut<'_> {
    fn event(&mut self, event: Event<'_>) -> Result<(), DocumentError> {
        self.writer
            .write_event(event)
            .map_err(|e| DocumentError::xml(self.path, e))
    }

    fn paragraph(&mut self, text: &str) -> Result<(), DocumentError> {
        let text = xml_safe(text);
        if text.is_empty() {
            return self.event(Event::Empty(BytesStart::new("w:p")));
        }
        self.event(Event::Start(BytesStart::new("w:p")))?;
        self.event(Event::Start(BytesStart::new("w:r")))?;
        self.event(Event::Start(
            BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
        ))?;
        self.event(Event::Text(BytesText::new(&text)))?;
        self.event(Event::End(BytesEnd::new("w:t")))?;
        self.event(Event::End(BytesEnd::new("w:r")))?;
        self.event(Event::End(BytesEnd::new("w:p")))
    }

    fn page_break(&mut self) -> Result<(), DocumentError> {
        self.event(Event::Start(BytesStart::new("w:p")))?;
        self.event(Event::Start(BytesStart::new("w:r")))?;
        self.event(Event::Empty(
            BytesStart::new("w:br").with_attributes([("w:type", "page")]),
        ))?;
        self.event(Event::End(BytesEnd::new("w:r")))?;
        self.event(Event::End(BytesEnd::new("w:p")))
    }

    // Letter, 1in margins (twentieths of a point).
    fn section_properties(&mut self) -> Result<(), DocumentError> {
        self.event(Event::Start(BytesStart::new("w:sectPr")))?;
        self.event(Event::Empty(
            BytesStart::new("w:pgSz").with_attributes([("w:w", "12240"), ("w:h", "15840")]),
        ))?;
        self.event(Event::Empty(BytesStart::new("w:pgMar").with_attributes([
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ])))?;
        self.event(Event::End(BytesEnd::new("w:sectPr")))
    }
}

/// Drop characters XML 1.0 cannot carry.
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_part(path: &Path, name: &str) -> String {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_write_produces_package_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        DocxBuilder::new()
            .paragraph("Hello")
            .page_break()
            .paragraph("World")
            .write(&path)
            .unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["[Content_Types].xml", "_rels/.rels", "word/document.xml"]);

        let xml = read_part(&path, DOCUMENT_PART);
        assert!(xml.contains(r#"<w:br w:type="page"/>"#));
        assert!(xml.contains(">Hello</w:t>"));
        assert!(xml.contains("<w:sectPr>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("esc.docx");
        DocxBuilder::new().paragraph("a < b & c").write(&path).unwrap();

        let xml = read_part(&path, DOCUMENT_PART);
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_paragraph_count_ignores_breaks() {
        let mut builder = DocxBuilder::new();
        builder.paragraph("one").page_break().paragraph("two");
        assert_eq!(builder.paragraph_count(), 2);
    }

    #[test]
    fn test_xml_safe_strips_control_chars() {
        assert_eq!(xml_safe("a\u{0}b\u{1b}c\td"), "abc\td");
    }
}
