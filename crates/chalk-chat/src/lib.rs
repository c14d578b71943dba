//! Conversation orchestration for the Chalk assistant.
//!
//! Holds the per-session transcript, merges uploaded-document text into the
//! next user turn, resolves pending turns against the hosted completion
//! service and keeps presentation-only feedback.

pub mod completion;
pub mod error;
pub mod feedback;
pub mod orchestrator;
pub mod registry;
pub mod session;
pub mod transcript;
pub mod types;

pub use completion::openai::OpenAiResponsesClient;
pub use completion::{
    CompletionError, CompletionRequest, CompletionService, RequestMessage, RetrievalTool,
};
pub use error::ChatError;
pub use feedback::{Feedback, FeedbackLog};
pub use orchestrator::{AssistantSettings, ChatOrchestrator, Command, CommandOutcome, ExportedReport};
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{AttachedDocument, ConversationSession};
pub use transcript::{PendingState, Transcript};
pub use types::{Rating, Role, Turn};
