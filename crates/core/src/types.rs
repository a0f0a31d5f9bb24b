// crates/core/src/types.rs
//! Shared conversion types.

use serde::{Deserialize, Serialize};

/// Direction of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionKind {
    PdfToWord,
    WordToPdf,
}

impl ConversionKind {
    /// Upload extensions accepted for this direction (lowercase, no dot).
    pub fn input_extensions(self) -> &'static [&'static str] {
        match self {
            Self::PdfToWord => &["pdf"],
            Self::WordToPdf => &["doc", "docx"],
        }
    }

    /// Extension of the produced file.
    pub fn output_extension(self) -> &'static str {
        match self {
            Self::PdfToWord => "docx",
            Self::WordToPdf => "pdf",
        }
    }

    /// MIME type of the produced file.
    pub fn output_mime(self) -> &'static str {
        match self {
            Self::PdfToWord => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::WordToPdf => "application/pdf",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PdfToWord => "pdf-to-word",
            Self::WordToPdf => "word-to-pdf",
        }
    }
}

impl std::fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
