//! Document handling for the Chalk assistant.
//!
//! Extracts plain text from uploaded PDF and Word files, and renders an
//! assistant answer back into a Word report for download.

pub mod error;
pub mod export;
pub mod extract;
pub mod kind;

pub use error::DocumentError;
pub use export::{render_report, report_filename};
pub use extract::extract_text;
pub use kind::{DocumentKind, DOCX_MIME};
