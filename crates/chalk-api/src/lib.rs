//! Chalk API crate - axum HTTP server for the chat assistant.
//!
//! Exposes the conversation as per-session REST resources: create a
//! session, attach a document, send messages, retry a pending turn, rate
//! answers and download them as Word reports. Also serves the embedded
//! chat page and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
