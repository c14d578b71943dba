use chalk_core::ChalkError;
use thiserror::Error;

/// Errors from document extraction and report rendering.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
    #[error("document is empty")]
    Empty,
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("Word extraction failed: {0}")]
    Docx(String),
    #[error("report export failed: {0}")]
    Export(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(err: zip::result::ZipError) -> Self {
        DocumentError::Docx(err.to_string())
    }
}

impl From<DocumentError> for ChalkError {
    fn from(err: DocumentError) -> Self {
        ChalkError::Document(err.to_string())
    }
}
