//! Core value types for the conversation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// One entry of the transcript.
///
/// `content` is what the completion service sees. `display_content` is what
/// the end user sees; it differs from `content` only when document text was
/// prepended to a user question. Turns are never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_content: Option<String>,
}

impl Turn {
    pub(crate) fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            display_content: None,
        }
    }

    pub(crate) fn user(content: String, display_content: String) -> Self {
        Self {
            role: Role::User,
            content,
            display_content: Some(display_content),
        }
    }

    pub(crate) fn assistant(text: String) -> Self {
        Self {
            role: Role::Assistant,
            display_content: Some(text.clone()),
            content: text,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn display_content(&self) -> Option<&str> {
        self.display_content.as_deref()
    }

    /// Text to show the end user, falling back to `content`.
    pub fn display_text(&self) -> &str {
        self.display_content.as_deref().unwrap_or(&self.content)
    }
}

/// Thumbs-up / thumbs-down signal on an assistant answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Positive,
    Negative,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Positive => write!(f, "positive"),
            Rating::Negative => write!(f, "negative"),
        }
    }
}

impl std::str::FromStr for Rating {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positive" | "up" | "+" => Ok(Rating::Positive),
            "negative" | "down" | "-" => Ok(Rating::Negative),
            _ => Err(format!("Unknown rating: {}", s)),
        }
    }
}
