//! Feedback on assistant answers.
//!
//! Feedback is a presentation-only sink: it is kept per session and logged,
//! but it never flows back into the transcript sent to the model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ChatError;
use crate::transcript::Transcript;
use crate::types::{Rating, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub turn_index: usize,
    pub rating: Rating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Feedback entries keyed by transcript position. Newer feedback on the
/// same position replaces the older entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedbackLog {
    entries: BTreeMap<usize, Feedback>,
}

impl FeedbackLog {
    pub fn record(
        &mut self,
        transcript: &Transcript,
        turn_index: usize,
        rating: Rating,
        comment: Option<String>,
    ) -> Result<&Feedback, ChatError> {
        let turn = transcript
            .get(turn_index)
            .ok_or(ChatError::TurnNotFound(turn_index))?;
        if turn.role() != Role::Assistant {
            return Err(ChatError::NotAssistantTurn(turn_index));
        }

        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let entry = Feedback {
            turn_index,
            rating,
            comment,
            submitted_at: Utc::now(),
        };
        self.entries.insert(turn_index, entry);
        Ok(&self.entries[&turn_index])
    }

    pub fn get(&self, turn_index: usize) -> Option<&Feedback> {
        self.entries.get(&turn_index)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Feedback> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
