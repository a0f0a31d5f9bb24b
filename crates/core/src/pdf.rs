//! PDF metadata and text access via `lopdf`.

use std::path::Path;

use lopdf::Document;

use crate::error::DocumentError;

/// Load a PDF from disk.
pub fn load(path: &Path) -> Result<Document, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Document::load(path).map_err(|e| DocumentError::pdf(path, e))
}

/// Number of pages, read from the page tree without touching content streams.
pub fn page_count(path: &Path) -> Result<usize, DocumentError> {
    Ok(load(path)?.get_pages().len())
}

/// Text lines of one page (1-based page number), blank lines dropped.
pub fn page_lines(
    doc: &Document,
    path: &Path,
    page_number: u32,
) -> Result<Vec<String>, DocumentError> {
    let text = doc
        .extract_text(&[page_number])
        .map_err(|e| DocumentError::pdf(path, e))?;
    Ok(text
        .lines()
        .map(|line| line.trim_end().to_string())
        .filter(|line| !line.trim().is_empty())
        .collect())
}

/// Geometry used when writing plain-text pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPageLayout {
    pub page_width: i64,
    pub page_height: i64,
    pub margin: i64,
    pub font_size: i64,
    pub leading: i64,
}

impl Default for TextPageLayout {
    /// US Letter, 1in margins, 11pt Helvetica.
    fn default() -> Self {
        Self {
            page_width: 612,
            page_height: 792,
            margin: 72,
            font_size: 11,
            leading: 14,
        }
    }
}

impl TextPageLayout {
    pub fn lines_per_page(&self) -> usize {
        let usable = self.page_height - 2 * self.margin;
        (usable / self.leading).max(1) as usize
    }

    /// Rough character budget per line; Helvetica averages about half an em.
    pub fn chars_per_line(&self) -> usize {
        let usable = (self.page_width - 2 * self.margin) * 2;
        (usable / self.font_size).max(1) as usize
    }
}

/// Write a PDF with one page per entry of `pages`, one text line per string.
///
/// Lines beyond [`TextPageLayout::lines_per_page`] are the caller's problem;
/// they are drawn below the bottom margin.
pub fn write_text_pages(
    path: &Path,
    pages: &[Vec<String>],
    layout: &TextPageLayout,
) -> Result<(), DocumentError> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for lines in pages {
        let mut operations = Vec::with_capacity(lines.len() * 5);
        let top = layout.page_height - layout.margin - layout.font_size;
        for (i, line) in lines.iter().enumerate() {
            let y = top - layout.leading * i as i64;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Integer(layout.font_size)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(layout.margin), Object::Integer(y)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_win_ansi(line))],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let bytes = content.encode().map_err(|e| DocumentError::pdf(path, e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(layout.page_width),
                Object::Integer(layout.page_height),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    doc.save(path).map_err(|e| DocumentError::io(path, e))?;
    Ok(())
}

/// Latin-1 subset of WinAnsi; anything else becomes `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u32 as u8,
            0x09 => b' ',
            _ => b'?',
        })
        .collect()
}
