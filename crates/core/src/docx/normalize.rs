// crates/core/src/docx/normalize.rs
//! Paragraph-spacing normalizer.
//!
//! Rewrites `w:spacing` on every top-level body paragraph of a `.docx` in
//! place. All other package parts are copied byte-for-byte. Paragraphs inside
//! tables, text boxes, or content controls are left as they are.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::reader::document_xml;
use super::DOCUMENT_PART;
use crate::error::DocumentError;

/// Spacing applied to each paragraph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphFormat {
    pub space_before_pt: f32,
    pub space_after_pt: f32,
    /// Multiple of single line height.
    pub line_spacing: f32,
}

impl Default for ParagraphFormat {
    fn default() -> Self {
        Self {
            space_before_pt: 0.0,
            space_after_pt: 6.0,
            line_spacing: 1.15,
        }
    }
}

impl ParagraphFormat {
    /// `w:before`, `w:after`, `w:line` values: twentieths of a point and
    /// 240ths of a line.
    fn spacing_values(&self) -> [String; 3] {
        [
            ((self.space_before_pt * 20.0).round().max(0.0) as u32).to_string(),
            ((self.space_after_pt * 20.0).round().max(0.0) as u32).to_string(),
            ((self.line_spacing * 240.0).round().max(0.0) as u32).to_string(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub format: ParagraphFormat,
    /// Report progress every this many paragraphs.
    pub progress_step: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            format: ParagraphFormat::default(),
            progress_step: 100,
        }
    }
}

/// Apply `options.format` to every body paragraph of the `.docx` at `path`.
///
/// `progress(done, total)` is called after every `progress_step` paragraphs.
/// Returns the number of paragraphs rewritten. The file is replaced
/// atomically; on error the original is left untouched.
pub fn normalize_paragraph_spacing(
    path: &Path,
    options: &NormalizeOptions,
    mut progress: impl FnMut(usize, usize),
) -> Result<usize, DocumentError> {
    let xml = document_xml(path)?;
    let total = count_body_paragraphs(&xml).map_err(|e| DocumentError::xml(path, e))?;
    let step = options.progress_step.max(1);

    let rewritten = rewrite_spacing(&xml, &options.format, |done| {
        if done % step == 0 {
            progress(done, total);
        }
    })
    .map_err(|e| DocumentError::xml(path, e))?;

    let tmp = staging_path(path);
    if let Err(e) = write_package(path, &tmp, &rewritten) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        DocumentError::io(path, e)
    })?;

    tracing::debug!(path = %path.display(), paragraphs = total, "Normalized paragraph spacing");
    Ok(total)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Copy every part of `source` into `dest`, swapping in a new main document.
fn write_package(source: &Path, dest: &Path, document: &[u8]) -> Result<(), DocumentError> {
    let input = std::fs::File::open(source).map_err(|e| DocumentError::io(source, e))?;
    let mut archive = ZipArchive::new(input).map_err(|e| DocumentError::package(source, e))?;

    let output = std::fs::File::create(dest).map_err(|e| DocumentError::io(dest, e))?;
    let mut zip = ZipWriter::new(output);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let entry = archive
            .by_index_raw(i)
            .map_err(|e| DocumentError::package(source, e))?;
        if entry.name() == DOCUMENT_PART {
            drop(entry);
            zip.start_file(DOCUMENT_PART, options)
                .map_err(|e| DocumentError::package(dest, e))?;
            zip.write_all(document).map_err(|e| DocumentError::io(dest, e))?;
        } else {
            zip.raw_copy_file(entry)
                .map_err(|e| DocumentError::package(dest, e))?;
        }
    }
    zip.finish().map_err(|e| DocumentError::package(dest, e))?;
    Ok(())
}

/// Children of `w:pPr` that the schema orders after `w:spacing`.
const AFTER_SPACING: &[&[u8]] = &[
    b"w:ind",
    b"w:contextualSpacing",
    b"w:mirrorIndents",
    b"w:suppressOverlap",
    b"w:jc",
    b"w:textDirection",
    b"w:textAlignment",
    b"w:textboxTightWrap",
    b"w:outlineLvl",
    b"w:divId",
    b"w:cnfStyle",
    b"w:rPr",
    b"w:sectPr",
    b"w:pPrChange",
];

/// Open-element count of a top-level body paragraph (`w:document/w:body/w:p`).
const BODY_PARAGRAPH_DEPTH: usize = 2;

fn count_body_paragraphs(xml: &str) -> Result<usize, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut count = 0;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == BODY_PARAGRAPH_DEPTH && e.name().as_ref() == b"w:p" {
                    count += 1;
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == BODY_PARAGRAPH_DEPTH && e.name().as_ref() == b"w:p" {
                    count += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => return Ok(count),
            _ => {}
        }
    }
}

enum State {
    Idle,
    /// Just opened a body paragraph; its properties may come next.
    ParagraphOpened,
    /// Inside a body paragraph's `w:pPr`, which sits at `depth` open elements.
    Properties { depth: usize, inserted: bool },
    /// Dropping an existing `w:spacing` element until its end tag.
    SkipSpacing {
        depth: usize,
        resume_depth: usize,
        inserted: bool,
    },
}

fn rewrite_spacing(
    xml: &str,
    format: &ParagraphFormat,
    mut on_paragraph: impl FnMut(usize),
) -> Result<Vec<u8>, quick_xml::Error> {
    let [before, after, line] = format.spacing_values();
    let spacing = BytesStart::new("w:spacing").with_attributes([
        ("w:before", before.as_str()),
        ("w:after", after.as_str()),
        ("w:line", line.as_str()),
        ("w:lineRule", "auto"),
    ]);

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(xml.len() + 1024)));
    let mut depth = 0usize;
    let mut done = 0usize;
    let mut state = State::Idle;

    let write_props = |w: &mut Writer<Cursor<Vec<u8>>>| -> Result<(), quick_xml::Error> {
        w.write_event(Event::Start(BytesStart::new("w:pPr")))?;
        w.write_event(Event::Empty(spacing.borrow()))?;
        w.write_event(Event::End(BytesEnd::new("w:pPr")))?;
        Ok(())
    };

    loop {
        let event = reader.read_event()?;
        if matches!(event, Event::Eof) {
            break;
        }

        state = match state {
            State::SkipSpacing {
                depth: skip,
                resume_depth,
                inserted,
            } => {
                track_depth(&event, &mut depth);
                if depth < skip {
                    State::Properties {
                        depth: resume_depth,
                        inserted,
                    }
                } else {
                    State::SkipSpacing {
                        depth: skip,
                        resume_depth,
                        inserted,
                    }
                }
            }
            State::ParagraphOpened => match &event {
                Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {
                    writer.write_event(event)?;
                    State::ParagraphOpened
                }
                // An existing pPr may still follow.
                Event::Comment(_) | Event::PI(_) => {
                    writer.write_event(event)?;
                    State::ParagraphOpened
                }
                Event::Start(e) if e.name().as_ref() == b"w:pPr" => {
                    writer.write_event(event)?;
                    depth += 1;
                    State::Properties {
                        depth,
                        inserted: false,
                    }
                }
                Event::Empty(e) if e.name().as_ref() == b"w:pPr" => {
                    write_props(&mut writer)?;
                    State::Idle
                }
                _ => {
                    write_props(&mut writer)?;
                    track_depth(&event, &mut depth);
                    writer.write_event(event)?;
                    State::Idle
                }
            },
            State::Properties {
                depth: props,
                inserted,
            } => {
                let at_child_level = depth == props;
                match &event {
                    Event::Empty(e) if at_child_level && e.name().as_ref() == b"w:spacing" => {
                        State::Properties {
                            depth: props,
                            inserted,
                        }
                    }
                    Event::Start(e) if at_child_level && e.name().as_ref() == b"w:spacing" => {
                        depth += 1;
                        State::SkipSpacing {
                            depth,
                            resume_depth: props,
                            inserted,
                        }
                    }
                    Event::End(e) if at_child_level && e.name().as_ref() == b"w:pPr" => {
                        if !inserted {
                            writer.write_event(Event::Empty(spacing.borrow()))?;
                        }
                        writer.write_event(event)?;
                        depth -= 1;
                        State::Idle
                    }
                    Event::Start(e) | Event::Empty(e)
                        if at_child_level
                            && !inserted
                            && AFTER_SPACING.contains(&e.name().as_ref()) =>
                    {
                        writer.write_event(Event::Empty(spacing.borrow()))?;
                        track_depth(&event, &mut depth);
                        writer.write_event(event)?;
                        State::Properties {
                            depth: props,
                            inserted: true,
                        }
                    }
                    _ => {
                        track_depth(&event, &mut depth);
                        writer.write_event(event)?;
                        State::Properties {
                            depth: props,
                            inserted,
                        }
                    }
                }
            }
            State::Idle => match &event {
                Event::Start(e)
                    if depth == BODY_PARAGRAPH_DEPTH && e.name().as_ref() == b"w:p" =>
                {
                    writer.write_event(event)?;
                    depth += 1;
                    done += 1;
                    on_paragraph(done);
                    State::ParagraphOpened
                }
                Event::Empty(e)
                    if depth == BODY_PARAGRAPH_DEPTH && e.name().as_ref() == b"w:p" =>
                {
                    writer.write_event(Event::Start(e.borrow()))?;
                    write_props(&mut writer)?;
                    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
                    done += 1;
                    on_paragraph(done);
                    State::Idle
                }
                _ => {
                    track_depth(&event, &mut depth);
                    writer.write_event(event)?;
                    State::Idle
                }
            },
        };
    }

    Ok(writer.into_inner().into_inner())
}

fn track_depth(event: &Event<'_>, depth: &mut usize) {
    match event {
        Event::Start(_) => *depth += 1,
        Event::End(_) => *depth = depth.saturating_sub(1),
        _ => {}
    }
}
