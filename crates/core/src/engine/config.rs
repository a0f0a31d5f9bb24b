// crates/core/src/engine/config.rs
//! Renderer configuration types.

use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for the Word → PDF renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    pub kind: RendererKind,
    /// LibreOffice executable, looked up on `PATH` when not absolute.
    pub soffice_bin: PathBuf,
}

/// Supported renderers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RendererKind {
    /// Built-in text layout; `.docx` only.
    #[default]
    Native,
    /// Headless LibreOffice.
    Soffice,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::Native,
            soffice_bin: PathBuf::from("soffice"),
        }
    }
}

impl RendererKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Soffice => "soffice",
        }
    }
}

impl FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "soffice" | "libreoffice" => Ok(Self::Soffice),
            other => Err(format!(
                "unknown renderer '{other}' (expected 'native' or 'soffice')"
            )),
        }
    }
}

impl std::fmt::Display for RendererKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
