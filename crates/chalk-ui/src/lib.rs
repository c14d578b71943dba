//! Chalk UI crate - Embedded chat page.
//!
//! The page is a single self-contained HTML file with all CSS and JavaScript
//! inline, embedded at compile time via `include_str!`. It talks to the
//! session endpoints of `chalk-api` on the same origin.
//!
//! ```rust,ignore
//! use chalk_ui::chat::CHAT_HTML;
//!
//! async fn ui_handler() -> axum::response::Html<&'static str> {
//!     axum::response::Html(CHAT_HTML)
//! }
//! ```

pub mod chat;

pub use chat::CHAT_HTML;
