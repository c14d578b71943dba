//! Per-session conversation state.

use chalk_document::DocumentKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::feedback::FeedbackLog;
use crate::transcript::Transcript;

/// Text extracted from the most recent upload, waiting to be merged into
/// the next user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachedDocument {
    pub filename: String,
    pub kind: DocumentKind,
    #[serde(skip)]
    pub text: String,
}

impl AttachedDocument {
    pub fn chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Everything one interactive session owns. Sessions share nothing.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    transcript: Transcript,
    attachment: Option<AttachedDocument>,
    feedback: FeedbackLog,
}

impl ConversationSession {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            updated_at: now,
            transcript: Transcript::new(system_prompt),
            attachment: None,
            feedback: FeedbackLog::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn attachment(&self) -> Option<&AttachedDocument> {
        self.attachment.as_ref()
    }

    pub fn feedback(&self) -> &FeedbackLog {
        &self.feedback
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub(crate) fn replace_attachment(&mut self, doc: AttachedDocument) -> &AttachedDocument {
        self.attachment.insert(doc)
    }

    pub(crate) fn take_attachment(&mut self) -> Option<AttachedDocument> {
        self.attachment.take()
    }

    /// Split borrow for recording feedback against the transcript.
    pub(crate) fn feedback_parts(&mut self) -> (&Transcript, &mut FeedbackLog) {
        (&self.transcript, &mut self.feedback)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let s = ConversationSession::new("prompt");
        assert_ne!(s.id(), Uuid::nil());
        assert_eq!(s.transcript().len(), 1);
        assert!(s.attachment().is_none());
        assert!(s.feedback().is_empty());
        assert_eq!(s.started_at(), s.updated_at());
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        let a = ConversationSession::new("p");
        let b = ConversationSession::new("p");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_attachment_replace_and_take() {
        let mut s = ConversationSession::new("p");
        s.replace_attachment(AttachedDocument {
            filename: "cct.pdf".into(),
            kind: DocumentKind::Pdf,
            text: "uno".into(),
        });
        s.replace_attachment(AttachedDocument {
            filename: "recibo.docx".into(),
            kind: DocumentKind::Docx,
            text: "dos".into(),
        });
        assert_eq!(s.attachment().unwrap().filename, "recibo.docx");

        let taken = s.take_attachment().unwrap();
        assert_eq!(taken.text, "dos");
        assert_eq!(taken.chars(), 3);
        assert!(s.attachment().is_none());
    }

    #[test]
    fn test_attachment_text_not_serialized() {
        let doc = AttachedDocument {
            filename: "cct.pdf".into(),
            kind: DocumentKind::Pdf,
            text: "secreto".into(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["filename"], "cct.pdf");
        assert_eq!(json["kind"], "pdf");
        assert!(json.get("text").is_none());
    }
}
