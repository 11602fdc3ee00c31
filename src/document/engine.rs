//! HTML to PDF conversion.
//!
//! Writes the rendered HTML into a per-call temporary directory, invokes the
//! external converter on it and reads the resulting PDF back. The directory is
//! removed when the `TempDir` guard drops, whichever way the call returns.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

use super::ConversionError;

const HTML_FILENAME: &str = "invoice.html";
const PDF_FILENAME: &str = "invoice.pdf";

/// Shells out to a wkhtmltopdf-compatible binary.
#[derive(Debug, Clone)]
pub struct PdfConverter {
    bin: String,
}

impl PdfConverter {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// Convert `html` to PDF bytes. Blocking; call it from `web::block`.
    pub fn convert(&self, html: &str) -> Result<Vec<u8>, ConversionError> {
        let temp_dir = tempdir().map_err(ConversionError::TempDir)?;
        let html_path = temp_dir.path().join(HTML_FILENAME);
        let pdf_path = temp_dir.path().join(PDF_FILENAME);

        fs::write(&html_path, html).map_err(ConversionError::WriteHtml)?;

        run_converter(&self.bin, &html_path, &pdf_path)?;

        let pdf = fs::read(&pdf_path).map_err(ConversionError::ReadPdf)?;
        log::debug!("{} produced {} bytes", self.bin, pdf.len());
        Ok(pdf)
    }
}

fn run_converter(bin: &str, html_path: &Path, pdf_path: &Path) -> Result<(), ConversionError> {
    let output = Command::new(bin)
        .arg("--enable-local-file-access")
        .arg("--print-media-type")
        .arg(html_path)
        .arg(pdf_path)
        .output()
        .map_err(|e| ConversionError::Spawn {
            bin: bin.to_string(),
            source: e,
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        Err(ConversionError::Exit {
            bin: bin.to_string(),
            status: output.status.to_string(),
        })
    } else {
        Err(ConversionError::Failed {
            bin: bin.to_string(),
            stderr,
        })
    }
}
