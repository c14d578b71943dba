//! Chat page HTML.
//!
//! One view: a header with the document upload control, the transcript of
//! visible turns, and the message input. Assistant turns carry thumbs
//! feedback (a negative rating opens a comment box) and a Word download
//! link.

/// The complete self-contained chat page.
///
/// Creates a session on load (`POST /sessions`), then drives it with:
///
/// - `PUT /sessions/{id}/document` for uploads, `DELETE` to clear
/// - `POST /sessions/{id}/messages` to ask, `POST /sessions/{id}/resolve` to retry
/// - `POST /sessions/{id}/turns/{index}/feedback`
/// - `GET /sessions/{id}/turns/{index}/export`
pub const CHAT_HTML: &str = include_str!("../assets/chat.html");
