//! Document rendering: HTML templates and PDF conversion.

pub mod engine;
pub mod template;

pub use engine::PdfConverter;
pub use template::TemplateRenderer;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while rendering an HTML template.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("views dir not found: {0}")]
    ViewsDirMissing(PathBuf),
    #[error("template file not found: {0}")]
    TemplateMissing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing templates {pattern} failed: {message}")]
    Parse { pattern: String, message: String },
    #[error("no template named {name:?} found (parsed templates: {available})")]
    NotFound { name: String, available: String },
    #[error("rendering failed: {0}")]
    Execute(String),
}

impl RenderError {
    /// Short machine-readable stage name, used in logs.
    pub fn stage(&self) -> &'static str {
        match self {
            RenderError::ViewsDirMissing(_) => "views_dir",
            RenderError::TemplateMissing(_) => "template_file",
            RenderError::Read { .. } => "read",
            RenderError::Parse { .. } => "parse",
            RenderError::NotFound { .. } => "lookup",
            RenderError::Execute(_) => "execute",
        }
    }
}

/// Errors raised while converting HTML to PDF.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write HTML: {0}")]
    WriteHtml(#[source] std::io::Error),
    #[error("failed to run {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{bin} failed: {stderr}")]
    Failed { bin: String, stderr: String },
    #[error("{bin} exited with {status}")]
    Exit { bin: String, status: String },
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
    #[error("PDF conversion was interrupted: {0}")]
    Blocking(String),
}
