//! The ordered, append-only conversation transcript.
//!
//! The first turn is always the system instruction. After it, user and
//! assistant turns strictly alternate. Whether a turn is waiting for an
//! answer is never stored; it is derived from the role of the last turn.

use serde::Serialize;

use crate::completion::RequestMessage;
use crate::error::ChatError;
use crate::types::{Role, Turn};

/// Lifecycle of the most recent user turn, derived from the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingState {
    /// Only the system instruction exists.
    NoPendingTurn,
    /// The last turn is a user turn without an answer.
    UserSubmitted,
    /// The last turn is an assistant answer.
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// A transcript always holds the system turn, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    pub fn last(&self) -> &Turn {
        // Index 0 is populated in `new` and turns are never removed.
        &self.turns[self.turns.len() - 1]
    }

    pub fn pending_state(&self) -> PendingState {
        match self.last().role() {
            Role::System => PendingState::NoPendingTurn,
            Role::User => PendingState::UserSubmitted,
            Role::Assistant => PendingState::Resolved,
        }
    }

    pub fn has_pending_turn(&self) -> bool {
        self.pending_state() == PendingState::UserSubmitted
    }

    /// Append a user turn.
    ///
    /// Returns `Ok(None)` without touching the transcript when `user_text`
    /// is blank. When `attached_text` carries text, the turn's `content` is
    /// `attached_text + separator + user_text` while `display_content`
    /// stays `user_text`.
    pub fn submit(
        &mut self,
        user_text: &str,
        attached_text: Option<&str>,
        separator: &str,
    ) -> Result<Option<usize>, ChatError> {
        if user_text.trim().is_empty() {
            return Ok(None);
        }
        if self.has_pending_turn() {
            return Err(ChatError::TurnPending);
        }

        let content = match attached_text.filter(|t| !t.trim().is_empty()) {
            Some(attached) => format!("{}{}{}", attached, separator, user_text),
            None => user_text.to_string(),
        };
        self.turns.push(Turn::user(content, user_text.to_string()));
        Ok(Some(self.turns.len() - 1))
    }

    /// Append the answer to the pending user turn.
    pub(crate) fn resolve(&mut self, answer: String) -> Result<usize, ChatError> {
        if !self.has_pending_turn() {
            return Err(ChatError::Storage(
                "answer appended without a pending user turn".to_string(),
            ));
        }
        self.turns.push(Turn::assistant(answer));
        Ok(self.turns.len() - 1)
    }

    /// The `(role, content)` list sent to the completion service.
    pub fn request_messages(&self) -> Vec<RequestMessage> {
        self.turns
            .iter()
            .map(|t| RequestMessage {
                role: t.role(),
                content: t.content().to_string(),
            })
            .collect()
    }

    /// User and assistant turns with their transcript positions.
    pub fn visible_turns(&self) -> impl Iterator<Item = (usize, &Turn)> {
        self.turns
            .iter()
            .enumerate()
            .filter(|(_, t)| t.role() != Role::System)
    }
}
