use std::fmt;

use serde::Serialize;

const PDF_MIME: &str = "application/pdf";
/// MIME type for Word documents, both uploads and generated reports.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Document formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Docx => write!(f, "docx"),
        }
    }
}

impl DocumentKind {
    /// Work out the format of an upload.
    ///
    /// The declared content type wins, then the filename extension, then
    /// the leading magic bytes. Generic types such as
    /// `application/octet-stream` fall through to the later checks.
    pub fn detect(
        content_type: Option<&str>,
        filename: Option<&str>,
        bytes: &[u8],
    ) -> Option<DocumentKind> {
        if let Some(kind) = content_type.and_then(Self::from_content_type) {
            return Some(kind);
        }
        if let Some(kind) = filename.and_then(Self::from_filename) {
            return Some(kind);
        }
        Self::sniff(bytes)
    }

    pub fn from_content_type(content_type: &str) -> Option<DocumentKind> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            PDF_MIME => Some(DocumentKind::Pdf),
            DOCX_MIME => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<DocumentKind> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    fn sniff(bytes: &[u8]) -> Option<DocumentKind> {
        if bytes.starts_with(b"%PDF-") {
            Some(DocumentKind::Pdf)
        } else if bytes.starts_with(b"PK\x03\x04") {
            Some(DocumentKind::Docx)
        } else {
            None
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_MIME,
            DocumentKind::Docx => DOCX_MIME,
        }
    }
}
