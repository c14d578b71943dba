//! Plain-text extraction from uploaded documents.
//!
//! A document is split into units (pages for PDF, paragraphs for Word).
//! Units with no visible text are dropped and the rest are joined with
//! newlines.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::DocumentError;
use crate::kind::DocumentKind;

const DOCX_BODY_PART: &str = "word/document.xml";

/// Extract the text of a document of a known format.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, DocumentError> {
    if bytes.is_empty() {
        return Err(DocumentError::Empty);
    }
    let units = match kind {
        DocumentKind::Pdf => pdf_pages(bytes)?,
        DocumentKind::Docx => docx_paragraphs(bytes)?,
    };
    let text = join_units(units);
    tracing::debug!(kind = %kind, chars = text.chars().count(), "Document text extracted");
    Ok(text)
}

/// Join text units with newlines, skipping units that are blank.
pub fn join_units<I>(units: I) -> String
where
    I: IntoIterator<Item = String>,
{
    units
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn pdf_pages(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    // pdf-extract panics instead of erroring on some malformed inputs.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| DocumentError::Pdf("malformed PDF".to_string()))?
        .map_err(|e| DocumentError::Pdf(e.to_string()))
}

fn docx_paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY_PART)
        .map_err(|_| DocumentError::Docx(format!("missing {}", DOCX_BODY_PART)))?
        .read_to_string(&mut xml)
        .map_err(|e| DocumentError::Docx(e.to_string()))?;
    paragraphs_from_document_xml(&xml)
}

/// Collect the text of every `w:p` element in a WordprocessingML body.
///
/// Paragraphs can nest (text boxes inside a paragraph), so open paragraphs
/// are kept on a stack and each one is emitted when it closes.
fn paragraphs_from_document_xml(xml: &str) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<String> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" => push_text(&mut open, "\t"),
                b"br" | b"cr" => push_text(&mut open, "\n"),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.decode().map_err(|e| DocumentError::Docx(e.to_string()))?;
                push_text(&mut open, &text);
            }
            Ok(Event::GeneralRef(r)) if in_text => {
                if r.is_char_ref() {
                    let resolved = r
                        .resolve_char_ref()
                        .map_err(|e| DocumentError::Docx(e.to_string()))?;
                    if let Some(ch) = resolved {
                        push_text(&mut open, ch.encode_utf8(&mut [0u8; 4]));
                    }
                } else {
                    let name = r.decode().map_err(|e| DocumentError::Docx(e.to_string()))?;
                    if let Some(value) = quick_xml::escape::resolve_predefined_entity(&name) {
                        push_text(&mut open, value);
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(done) = open.pop() {
                        paragraphs.push(done);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::Docx(format!(
                    "invalid XML at byte {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_text(open: &mut [String], text: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(text);
    }
}
