//! Route handler functions for all API endpoints.
//!
//! Every session-scoped handler looks the session up in the registry,
//! locks it for the rest of the request and applies orchestrator commands
//! to it.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chalk_chat::{Command, CommandOutcome, ConversationSession, Feedback, Rating, Role};
use chalk_document::{DocumentKind, DOCX_MIME};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DocumentParams {
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub rating: Rating,
    pub comment: Option<String>,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

/// A visible transcript turn. System turns are never exposed.
#[derive(Debug, Serialize)]
pub struct TurnView {
    pub index: usize,
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AttachmentView {
    pub filename: String,
    pub kind: DocumentKind,
    pub chars: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub turns: Vec<TurnView>,
    /// True when the last user turn has no answer yet.
    pub pending: bool,
    pub attachment: Option<AttachmentView>,
    pub feedback: Vec<Feedback>,
}

impl From<&ConversationSession> for SessionView {
    fn from(session: &ConversationSession) -> Self {
        Self {
            id: session.id(),
            started_at: session.started_at(),
            updated_at: session.updated_at(),
            turns: session
                .transcript()
                .visible_turns()
                .map(|(index, turn)| TurnView {
                    index,
                    role: turn.role(),
                    text: turn.display_text().to_string(),
                })
                .collect(),
            pending: session.transcript().has_pending_turn(),
            attachment: session.attachment().map(|doc| AttachmentView {
                filename: doc.filename.clone(),
                kind: doc.kind,
                chars: doc.chars(),
            }),
            feedback: session.feedback().entries().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearDocumentResponse {
    pub had_document: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub index: usize,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub user_index: usize,
    pub assistant_index: usize,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    /// False when there was no pending turn to answer.
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

fn answer_at(session: &ConversationSession, index: usize) -> String {
    session
        .transcript()
        .get(index)
        .map(|t| t.content().to_string())
        .unwrap_or_default()
}

// =============================================================================
// Public endpoints
// =============================================================================

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.registry.len(),
    })
}

/// GET / and GET /ui - serve the self-contained chat page.
pub async fn ui() -> impl IntoResponse {
    Html(chalk_ui::CHAT_HTML)
}

// =============================================================================
// Sessions
// =============================================================================

/// POST /sessions - start a conversation.
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let session = state.orchestrator.new_session();
    let view = SessionView::from(&session);
    state.registry.create(session)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.registry.get(id)?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

/// DELETE /sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.registry.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Documents
// =============================================================================

/// PUT /sessions/{id}/document?filename= - raw upload body.
///
/// The format comes from the `Content-Type` header, then the filename
/// extension, then the file's magic bytes.
pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DocumentParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AttachmentView>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Upload body is empty".to_string()));
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let filename = params
        .filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| "documento".to_string());

    let handle = state.registry.get(id)?;
    let mut session = handle.lock().await;
    let outcome = state
        .orchestrator
        .dispatch(
            &mut session,
            Command::AttachDocument {
                filename,
                content_type,
                bytes: body.to_vec(),
            },
        )
        .await?;

    match outcome {
        CommandOutcome::Attached {
            filename,
            kind,
            chars,
        } => Ok(Json(AttachmentView {
            filename,
            kind,
            chars,
        })),
        other => Err(ApiError::Internal(format!(
            "Unexpected outcome for upload: {:?}",
            other
        ))),
    }
}

/// DELETE /sessions/{id}/document
pub async fn clear_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClearDocumentResponse>, ApiError> {
    let handle = state.registry.get(id)?;
    let mut session = handle.lock().await;
    let outcome = state
        .orchestrator
        .dispatch(&mut session, Command::ClearDocument)
        .await?;
    let had_document = matches!(outcome, CommandOutcome::Cleared { had_document: true });
    Ok(Json(ClearDocumentResponse { had_document }))
}

// =============================================================================
// Messages
// =============================================================================

/// POST /sessions/{id}/messages - submit a question and wait for the answer.
///
/// When the completion service fails the user turn stays in the session as
/// pending and the error is returned; `POST /resolve` retries it.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Message text is empty".to_string()));
    }

    let handle = state.registry.get(id)?;
    let mut session = handle.lock().await;
    let orchestrator = &state.orchestrator;

    let user_index = match orchestrator
        .dispatch(&mut session, Command::Submit { text: req.text })
        .await?
    {
        CommandOutcome::Submitted { index } => index,
        _ => return Err(ApiError::BadRequest("Message text is empty".to_string())),
    };

    match orchestrator
        .dispatch(&mut session, Command::ResolvePending)
        .await?
    {
        CommandOutcome::Resolved { index } => Ok(Json(MessageResponse {
            user_index,
            assistant_index: index,
            answer: answer_at(&session, index),
        })),
        other => Err(ApiError::Internal(format!(
            "Unexpected outcome for message: {:?}",
            other
        ))),
    }
}

/// POST /sessions/{id}/resolve - answer the pending turn, if any.
pub async fn resolve_pending(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let handle = state.registry.get(id)?;
    let mut session = handle.lock().await;
    let outcome = state
        .orchestrator
        .dispatch(&mut session, Command::ResolvePending)
        .await?;

    let response = match outcome {
        CommandOutcome::Resolved { index } => ResolveResponse {
            resolved: true,
            index: Some(index),
            answer: Some(answer_at(&session, index)),
        },
        _ => ResolveResponse {
            resolved: false,
            index: None,
            answer: None,
        },
    };
    Ok(Json(response))
}

// =============================================================================
// Turns
// =============================================================================

/// POST /sessions/{id}/turns/{index}/feedback
pub async fn post_feedback(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<Feedback>, ApiError> {
    let handle = state.registry.get(id)?;
    let mut session = handle.lock().await;
    state
        .orchestrator
        .dispatch(
            &mut session,
            Command::Feedback {
                turn_index: index,
                rating: req.rating,
                comment: req.comment,
            },
        )
        .await?;

    session
        .feedback()
        .get(index)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::Internal("Feedback was not recorded".to_string()))
}

/// GET /sessions/{id}/turns/{index}/export - Word report download.
pub async fn export_turn(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = state.registry.get(id)?;
    let session = handle.lock().await;
    let report = state.orchestrator.export_turn(&session, index)?;

    tracing::info!(session_id = %id, turn_index = index, bytes = report.bytes.len(), "Report exported");

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.filename),
            ),
        ],
        report.bytes,
    ))
}
