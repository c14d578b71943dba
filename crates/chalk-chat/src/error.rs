//! Error types for the conversation layer.

use chalk_core::ChalkError;
use chalk_document::DocumentError;

use crate::completion::CompletionError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("a previous message is still waiting for an answer")]
    TurnPending,
    #[error("turn {0} does not exist")]
    TurnNotFound(usize),
    #[error("turn {0} is not an assistant answer")]
    NotAssistantTurn(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl From<ChatError> for ChalkError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Config(msg) => ChalkError::Config(msg),
            ChatError::Document(e) => e.into(),
            ChatError::Completion(e) => ChalkError::Completion(e.to_string()),
            other => ChalkError::Chat(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(
            ChatError::TurnPending.to_string(),
            "a previous message is still waiting for an answer"
        );
        assert_eq!(ChatError::TurnNotFound(7).to_string(), "turn 7 does not exist");
        assert_eq!(
            ChatError::NotAssistantTurn(1).to_string(),
            "turn 1 is not an assistant answer"
        );

        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            ChatError::SessionNotFound(id).to_string(),
            "session not found: 550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_transparent_wrappers_keep_inner_message() {
        let err: ChatError = DocumentError::Pdf("encrypted".into()).into();
        assert_eq!(err.to_string(), "PDF extraction failed: encrypted");

        let err: ChatError = CompletionError::RateLimited.into();
        assert_eq!(err.to_string(), "completion service rate limit exceeded");
    }

    #[test]
    fn test_into_chalk_error() {
        let err: ChalkError = ChatError::Config("missing vector store".into()).into();
        assert!(matches!(err, ChalkError::Config(_)));

        let err: ChalkError = ChatError::Completion(CompletionError::Network("reset".into())).into();
        assert!(matches!(err, ChalkError::Completion(_)));

        let err: ChalkError = ChatError::TurnPending.into();
        assert!(matches!(err, ChalkError::Chat(_)));
    }

    #[test]
    fn test_errors_implement_debug() {
        let dbg = format!("{:?}", ChatError::TurnPending);
        assert!(dbg.contains("TurnPending"));
    }
}
