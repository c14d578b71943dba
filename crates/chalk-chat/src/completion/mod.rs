//! The hosted completion service seam.
//!
//! The orchestrator only knows [`CompletionService`]; the production
//! implementation talks to the OpenAI Responses API in [`openai`].

pub mod openai;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::Role;

/// One `(role, content)` pair of the outgoing conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMessage {
    pub role: Role,
    pub content: String,
}

/// Tools the model may call while answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetrievalTool {
    /// Search over uploaded knowledge-store files.
    FileSearch { vector_store_ids: Vec<String> },
}

impl RetrievalTool {
    pub fn file_search(vector_store_id: impl Into<String>) -> Self {
        RetrievalTool::FileSearch {
            vector_store_ids: vec![vector_store_id.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<RequestMessage>,
    pub tools: Vec<RetrievalTool>,
}

/// Failures talking to the completion service.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion service unreachable: {0}")]
    Network(String),
    #[error("completion service rejected the credentials: {0}")]
    Authentication(String),
    #[error("completion service rate limit exceeded")]
    RateLimited,
    #[error("completion service returned HTTP {status}: {body}")]
    Service { status: u16, body: String },
    #[error("completion service sent an unreadable response: {0}")]
    InvalidResponse(String),
    #[error("completion client misconfigured: {0}")]
    Config(String),
}

/// Anything that can turn a conversation into an answer.
///
/// An empty string is a valid answer; callers decide how to present it.
#[async_trait]
pub trait CompletionService: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
