//! Upload validation and naming rules.
//!
//! Client filenames are never used to build paths on disk: they only decide
//! whether an upload is accepted and what the delivered attachment is called.

use crate::error::ValidationError;
use crate::types::ConversionKind;

/// Every extension the service accepts, across both directions.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// Default upload ceiling: 16 MiB.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// A client filename that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadName {
    original: String,
    extension: String,
}

impl UploadName {
    /// The filename as sent by the client.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// Validate the `file` field of an upload for the given direction.
///
/// `None` means the multipart body had no `file` field at all.
pub fn validate_upload(
    filename: Option<&str>,
    kind: ConversionKind,
) -> Result<UploadName, ValidationError> {
    let filename = filename.ok_or(ValidationError::MissingFile)?;
    if filename.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    let unsupported = || ValidationError::UnsupportedExtension {
        filename: filename.to_string(),
    };
    let extension = extension_of(filename).ok_or_else(unsupported)?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str())
        || !kind.input_extensions().contains(&extension.as_str())
    {
        return Err(unsupported());
    }

    Ok(UploadName {
        original: filename.to_string(),
        extension,
    })
}

/// Lowercased text after the last dot of the last path component.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = last_component(filename).rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Client filename without directories or extension.
///
/// Falls back to `"document"` when nothing usable remains.
pub fn base_name(filename: &str) -> &str {
    let name = last_component(filename);
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    };
    if stem.trim().is_empty() {
        "document"
    } else {
        stem
    }
}

/// Attachment name for the converted file, e.g. `report.pdf` → `report.docx`.
pub fn download_name(original: &str, kind: ConversionKind) -> String {
    format!("{}.{}", base_name(original), kind.output_extension())
}

fn last_component(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_pdf_for_pdf_to_word() {
        let name = validate_upload(Some("Report.PDF"), ConversionKind::PdfToWord).unwrap();
        assert_eq!(name.original(), "Report.PDF");
        assert_eq!(name.extension(), "pdf");
    }

    #[test]
    fn test_accepts_doc_and_docx_for_word_to_pdf() {
        assert!(validate_upload(Some("a.doc"), ConversionKind::WordToPdf).is_ok());
        assert!(validate_upload(Some("a.docx"), ConversionKind::WordToPdf).is_ok());
    }

    #[test]
    fn test_rejects_wrong_direction() {
        let err = validate_upload(Some("a.docx"), ConversionKind::PdfToWord).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedExtension { .. }));
    }

    #[test]
    fn test_rejects_txt() {
        let err = validate_upload(Some("notes.txt"), ConversionKind::PdfToWord).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedExtension {
                filename: "notes.txt".into()
            }
        );
    }

    #[test]
    fn test_rejects_missing_and_empty() {
        assert_eq!(
            validate_upload(None, ConversionKind::PdfToWord).unwrap_err(),
            ValidationError::MissingFile
        );
        assert_eq!(
            validate_upload(Some(""), ConversionKind::PdfToWord).unwrap_err(),
            ValidationError::EmptyFilename
        );
    }

    #[test]
    fn test_rejects_no_extension() {
        assert!(validate_upload(Some("pdf"), ConversionKind::PdfToWord).is_err());
        assert!(validate_upload(Some("file."), ConversionKind::PdfToWord).is_err());
    }

    #[test]
    fn test_base_name_strips_directories() {
        assert_eq!(base_name("C:\\Users\\me\\thesis.final.pdf"), "thesis.final");
        assert_eq!(base_name("/tmp/report.pdf"), "report");
        assert_eq!(base_name(".pdf"), "document");
        assert_eq!(base_name("readme"), "readme");
    }

    #[test]
    fn test_download_name() {
        assert_eq!(download_name("季度报告.pdf", ConversionKind::PdfToWord), "季度报告.docx");
        assert_eq!(download_name("letter.doc", ConversionKind::WordToPdf), "letter.pdf");
    }
}
