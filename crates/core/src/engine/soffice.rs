// crates/core/src/engine/soffice.rs
//! LibreOffice renderer: runs `soffice --headless --convert-to pdf`.
//!
//! Every render gets a throwaway user profile. soffice locks its profile, so
//! concurrent renders sharing the default one fail.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::traits::PdfRenderer;
use crate::error::DocumentError;

/// Renderer that shells out to a LibreOffice install.
#[derive(Debug, Clone)]
pub struct SofficeRenderer {
    binary: PathBuf,
}

impl SofficeRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn tool(&self) -> String {
        self.binary.display().to_string()
    }

    fn command(&self, input: &Path, out_dir: &Path, profile: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg(format!("-env:UserInstallation={}", file_url(profile)))
            .arg("--headless")
            .arg("--norestore")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(input);
        command
    }
}

/// `file://` URL for an absolute directory, as soffice expects.
fn file_url(dir: &Path) -> String {
    let path = dir.display().to_string().replace('\\', "/");
    let path = path.replace(' ', "%20");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

impl Default for SofficeRenderer {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl PdfRenderer for SofficeRenderer {
    fn render(&self, input: &Path, output: &Path) -> Result<(), DocumentError> {
        if !input.exists() {
            return Err(DocumentError::NotFound {
                path: input.to_path_buf(),
            });
        }
        let out_dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let stem = input
            .file_stem()
            .ok_or_else(|| DocumentError::unsupported(input, "input has no file name"))?;

        tracing::debug!(
            binary = %self.binary.display(),
            input = %input.display(),
            "Spawning soffice"
        );
        let profile = tempfile::Builder::new()
            .prefix("docbridge-soffice-")
            .tempdir()
            .map_err(|e| DocumentError::io(std::env::temp_dir(), e))?;
        let result = self
            .command(input, out_dir, profile.path())
            .output()
            .map_err(|source| DocumentError::ToolUnavailable {
                tool: self.tool(),
                source,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(DocumentError::ToolFailed {
                tool: self.tool(),
                message: format!("exit status {}: {}", result.status, stderr.trim()),
            });
        }

        // soffice names its output after the input stem.
        let mut produced = out_dir.join(stem);
        produced.set_extension("pdf");
        if !produced.exists() {
            return Err(DocumentError::ToolFailed {
                tool: self.tool(),
                message: format!("expected output {} was not written", produced.display()),
            });
        }
        if produced != output {
            std::fs::rename(&produced, output).map_err(|e| DocumentError::io(output, e))?;
        }
        Ok(())
    }

    fn accepts(&self, extension: &str) -> bool {
        matches!(extension, "doc" | "docx")
    }

    fn name(&self) -> &str {
        "soffice"
    }
}
