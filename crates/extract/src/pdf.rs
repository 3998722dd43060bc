//! PDF → per-page text.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ExtractError;

/// Source of page text for a statement file.
pub trait PdfTextReader {
    /// One string per page, in order.
    fn pages(&self, path: &Path) -> Result<Vec<String>, ExtractError>;
}

/// Runs `pdftotext -layout <file> -` (poppler-utils).
#[derive(Debug, Clone)]
pub struct Pdftotext {
    binary: PathBuf,
}

impl Pdftotext {
    /// Find `pdftotext` on PATH.
    pub fn locate() -> Result<Self, ExtractError> {
        let binary = which::which("pdftotext").map_err(|_| ExtractError::PdftotextMissing)?;
        Ok(Self { binary })
    }
}

impl PdfTextReader for Pdftotext {
    fn pages(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        let fail = |message: String| ExtractError::Pdftotext {
            path: path.to_path_buf(),
            message,
        };

        let output = Command::new(&self.binary)
            .arg("-layout")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| fail(format!("failed to run pdftotext: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!(
                "exit {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        if text.trim().is_empty() {
            return Err(fail("PDF appears scanned/image-only, no text extracted".to_string()));
        }
        Ok(split_pages(&text))
    }
}

/// pdftotext ends every page with a form feed.
pub fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}
