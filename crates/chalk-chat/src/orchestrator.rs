//! Chat orchestrator: applies user interactions to a session.
//!
//! Every interaction is an explicit [`Command`] applied to a
//! `&mut ConversationSession`. A message submit is two commands: `Submit`
//! appends the user turn, `ResolvePending` asks the completion service for
//! the answer. Because the pending state is derived from the transcript,
//! resolving twice never sends the same turn twice, and a turn whose
//! completion failed stays pending until the next resolve.

use std::sync::Arc;

use chalk_core::ChalkConfig;
use chalk_document::{extract_text, render_report, report_filename, DocumentError, DocumentKind};
use serde::Serialize;

use crate::completion::{CompletionRequest, CompletionService, RetrievalTool};
use crate::error::ChatError;
use crate::feedback::Feedback;
use crate::session::{AttachedDocument, ConversationSession};
use crate::types::{Rating, Role};

/// Wording and identifiers the orchestrator needs for every session.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub system_prompt: String,
    pub attachment_separator: String,
    pub fallback_answer: String,
    /// Knowledge store bound to the retrieval tool.
    pub vector_store_id: String,
    pub report_heading: String,
    pub report_filename_prefix: String,
}

impl AssistantSettings {
    pub fn from_config(config: &ChalkConfig) -> Result<Self, ChatError> {
        let vector_store_id = config
            .openai
            .vector_store_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ChatError::Config("vector store id is not set".to_string()))?;
        Ok(Self {
            system_prompt: config.assistant.system_prompt.clone(),
            attachment_separator: config.assistant.attachment_separator.clone(),
            fallback_answer: config.assistant.fallback_answer.clone(),
            vector_store_id,
            report_heading: config.export.report_heading.clone(),
            report_filename_prefix: config.export.filename_prefix.clone(),
        })
    }
}

/// A user interaction.
#[derive(Debug, Clone)]
pub enum Command {
    AttachDocument {
        filename: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
    ClearDocument,
    Submit {
        text: String,
    },
    ResolvePending,
    Feedback {
        turn_index: usize,
        rating: Rating,
        comment: Option<String>,
    },
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Attached {
        filename: String,
        kind: DocumentKind,
        chars: usize,
    },
    Cleared {
        had_document: bool,
    },
    Submitted {
        index: usize,
    },
    /// Blank submission; nothing was appended.
    Ignored,
    Resolved {
        index: usize,
    },
    NothingPending,
    FeedbackRecorded {
        turn_index: usize,
    },
}

/// A rendered Word report ready for download.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct ChatOrchestrator {
    completion: Arc<dyn CompletionService>,
    settings: AssistantSettings,
}

impl ChatOrchestrator {
    pub fn new(completion: Arc<dyn CompletionService>, settings: AssistantSettings) -> Self {
        Self {
            completion,
            settings,
        }
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    /// Start a session whose transcript holds only the system instruction.
    pub fn new_session(&self) -> ConversationSession {
        let session = ConversationSession::new(self.settings.system_prompt.clone());
        tracing::info!(session_id = %session.id(), "Session started");
        session
    }

    /// Apply one command to the session.
    pub async fn dispatch(
        &self,
        session: &mut ConversationSession,
        command: Command,
    ) -> Result<CommandOutcome, ChatError> {
        let outcome = match command {
            Command::AttachDocument {
                filename,
                content_type,
                bytes,
            } => {
                let doc =
                    self.attach_document(session, filename, content_type.as_deref(), &bytes)?;
                CommandOutcome::Attached {
                    filename: doc.filename.clone(),
                    kind: doc.kind,
                    chars: doc.chars(),
                }
            }
            Command::ClearDocument => CommandOutcome::Cleared {
                had_document: self.clear_document(session),
            },
            Command::Submit { text } => match self.submit(session, &text)? {
                Some(index) => CommandOutcome::Submitted { index },
                None => CommandOutcome::Ignored,
            },
            Command::ResolvePending => match self.resolve_pending_turn(session).await? {
                Some(index) => CommandOutcome::Resolved { index },
                None => CommandOutcome::NothingPending,
            },
            Command::Feedback {
                turn_index,
                rating,
                comment,
            } => {
                self.record_feedback(session, turn_index, rating, comment)?;
                CommandOutcome::FeedbackRecorded { turn_index }
            }
        };
        session.touch();
        Ok(outcome)
    }

    /// Submit a message and resolve it, as a chat input does.
    ///
    /// Returns the index of the assistant turn, or `None` when the message
    /// was blank and nothing was pending.
    pub async fn send(
        &self,
        session: &mut ConversationSession,
        text: &str,
    ) -> Result<Option<usize>, ChatError> {
        self.dispatch(session, Command::Submit { text: text.to_string() })
            .await?;
        match self.dispatch(session, Command::ResolvePending).await? {
            CommandOutcome::Resolved { index } => Ok(Some(index)),
            _ => Ok(None),
        }
    }

    /// Extract an upload and hold its text for the next user turn.
    ///
    /// Replaces any earlier attachment. An upload with no extractable text
    /// is rejected so the user is not misled into thinking it was read.
    pub fn attach_document<'s>(
        &self,
        session: &'s mut ConversationSession,
        filename: String,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<&'s AttachedDocument, ChatError> {
        let kind = DocumentKind::detect(content_type, Some(filename.as_str()), bytes)
            .ok_or_else(|| {
                DocumentError::UnsupportedFormat(
                    content_type
                        .map(str::to_string)
                        .unwrap_or_else(|| filename.clone()),
                )
            })?;
        let text = extract_text(kind, bytes)?;
        if text.trim().is_empty() {
            return Err(DocumentError::Empty.into());
        }

        let doc = AttachedDocument {
            filename,
            kind,
            text,
        };
        tracing::info!(
            session_id = %session.id(),
            filename = %doc.filename,
            kind = %doc.kind,
            chars = doc.chars(),
            "Document attached"
        );
        Ok(session.replace_attachment(doc))
    }

    /// Drop the pending attachment. Returns whether there was one.
    pub fn clear_document(&self, session: &mut ConversationSession) -> bool {
        let had = session.take_attachment().is_some();
        if had {
            tracing::info!(session_id = %session.id(), "Document cleared");
        }
        had
    }

    /// Append a user turn, consuming the pending attachment.
    ///
    /// Blank text is ignored and leaves the attachment in place. Submitting
    /// while an earlier turn is unanswered is rejected.
    pub fn submit(
        &self,
        session: &mut ConversationSession,
        text: &str,
    ) -> Result<Option<usize>, ChatError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        if session.transcript().has_pending_turn() {
            return Err(ChatError::TurnPending);
        }

        let attachment = session.take_attachment();
        let index = session.transcript_mut().submit(
            text,
            attachment.as_ref().map(|d| d.text.as_str()),
            &self.settings.attachment_separator,
        )?;
        if let Some(index) = index {
            tracing::info!(
                session_id = %session.id(),
                turn_index = index,
                with_document = attachment.is_some(),
                "User turn submitted"
            );
        }
        Ok(index)
    }

    /// Ask the completion service to answer the trailing user turn.
    ///
    /// Does nothing unless the last turn is a user turn. On failure the
    /// error is returned and the transcript is left untouched, so the same
    /// turn is sent again on the next call.
    pub async fn resolve_pending_turn(
        &self,
        session: &mut ConversationSession,
    ) -> Result<Option<usize>, ChatError> {
        if !session.transcript().has_pending_turn() {
            return Ok(None);
        }

        let request = CompletionRequest {
            messages: session.transcript().request_messages(),
            tools: vec![RetrievalTool::file_search(
                self.settings.vector_store_id.clone(),
            )],
        };

        let answer = match self.completion.complete(&request).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(
                    session_id = %session.id(),
                    service = self.completion.name(),
                    error = %e,
                    "Completion failed; turn left pending"
                );
                return Err(e.into());
            }
        };

        let answer = if answer.trim().is_empty() {
            tracing::warn!(session_id = %session.id(), "Empty completion; using fallback answer");
            self.settings.fallback_answer.clone()
        } else {
            answer
        };
        let index = session.transcript_mut().resolve(answer)?;
        tracing::info!(session_id = %session.id(), turn_index = index, "Assistant turn appended");
        Ok(Some(index))
    }

    pub fn record_feedback<'s>(
        &self,
        session: &'s mut ConversationSession,
        turn_index: usize,
        rating: Rating,
        comment: Option<String>,
    ) -> Result<&'s Feedback, ChatError> {
        let session_id = session.id();
        let (transcript, log) = session.feedback_parts();
        let entry = log.record(transcript, turn_index, rating, comment)?;
        tracing::info!(
            session_id = %session_id,
            turn_index,
            rating = %entry.rating,
            has_comment = entry.comment.is_some(),
            "Feedback received"
        );
        Ok(entry)
    }

    /// Render the assistant turn at `turn_index` as a Word report.
    pub fn export_turn(
        &self,
        session: &ConversationSession,
        turn_index: usize,
    ) -> Result<ExportedReport, ChatError> {
        let turn = session
            .transcript()
            .get(turn_index)
            .ok_or(ChatError::TurnNotFound(turn_index))?;
        if turn.role() != Role::Assistant {
            return Err(ChatError::NotAssistantTurn(turn_index));
        }
        let bytes = render_report(&self.settings.report_heading, turn.content())?;
        Ok(ExportedReport {
            filename: report_filename(&self.settings.report_filename_prefix, turn_index),
            bytes,
        })
    }
}
