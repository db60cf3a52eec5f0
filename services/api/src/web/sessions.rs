//! services/api/src/web/sessions.rs
//!
//! Handlers for the session lifecycle. Like the request endpoints, they reply
//! with the session's current state and never report a skipped transition.

use crate::web::{not_found, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tutoring_core::{PromptRole, Role, Session, WorkflowEngine};
use utoipa::ToSchema;

//=========================================================================================
// Payload Structs
//=========================================================================================

/// An optional timestamp; the engine clock is used when absent.
#[derive(Deserialize, Default, ToSchema)]
pub struct TimestampBody {
    pub at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, ToSchema)]
pub struct RescheduleBody {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct TutorNoteBody {
    pub note: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, ToSchema)]
pub struct FeedbackBody {
    pub role: Role,
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

fn current(engine: &WorkflowEngine, id: &str) -> Result<Json<Session>, (StatusCode, String)> {
    engine
        .session(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("session", id))
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "The session", body = Session),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Session>, (StatusCode, String)> {
    current(&*app_state.engine.lock().await, &id)
}

/// Parent approval of a proposed session.
#[utoipa::path(
    post,
    path = "/sessions/{id}/approve",
    params(("id" = String, Path, description = "Session id")),
    request_body = TimestampBody,
    responses(
        (status = 200, description = "Current state of the session", body = Session),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn approve_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TimestampBody>,
) -> Result<Json<Session>, (StatusCode, String)> {
    let mut engine = app_state.engine.lock().await;
    engine.approve_session(&id, body.at);
    current(&engine, &id)
}

/// Move a session that has not started to a new window.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reschedule",
    params(("id" = String, Path, description = "Session id")),
    request_body = RescheduleBody,
    responses(
        (status = 200, description = "Current state of the session", body = Session),
        (status = 400, description = "Inverted session window"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn reschedule_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RescheduleBody>,
) -> Result<Json<Session>, (StatusCode, String)> {
    if body.end_at <= body.start_at {
        return Err((
            StatusCode::BAD_REQUEST,
            "end_at must be after start_at".to_string(),
        ));
    }
    let mut engine = app_state.engine.lock().await;
    engine.reschedule_session(&id, body.start_at, body.end_at);
    current(&engine, &id)
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/cancel",
    params(("id" = String, Path, description = "Session id")),
    request_body = TimestampBody,
    responses(
        (status = 200, description = "Current state of the session", body = Session),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn cancel_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TimestampBody>,
) -> Result<Json<Session>, (StatusCode, String)> {
    let mut engine = app_state.engine.lock().await;
    engine.cancel_session(&id, body.at);
    current(&engine, &id)
}

/// Tutor's post-session note.
#[utoipa::path(
    post,
    path = "/sessions/{id}/notes",
    params(("id" = String, Path, description = "Session id")),
    request_body = TutorNoteBody,
    responses(
        (status = 200, description = "Current state of the session", body = Session),
        (status = 400, description = "Empty note"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn submit_note_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TutorNoteBody>,
) -> Result<Json<Session>, (StatusCode, String)> {
    let note = body.note.trim();
    if note.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "note must not be empty".to_string()));
    }
    let mut engine = app_state.engine.lock().await;
    engine.submit_tutor_note(&id, note.to_string(), body.submitted_at);
    current(&engine, &id)
}

/// Confirm that a feedback prompt reached the parent or the child.
#[utoipa::path(
    post,
    path = "/sessions/{id}/prompts/{role}",
    params(
        ("id" = String, Path, description = "Session id"),
        ("role" = PromptRole, Path, description = "parent or child")
    ),
    request_body = TimestampBody,
    responses(
        (status = 200, description = "Current state of the session", body = Session),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn deliver_prompt_handler(
    State(app_state): State<Arc<AppState>>,
    Path((id, role)): Path<(String, PromptRole)>,
    Json(body): Json<TimestampBody>,
) -> Result<Json<Session>, (StatusCode, String)> {
    let mut engine = app_state.engine.lock().await;
    engine.deliver_feedback_prompt(&id, role, body.at);
    current(&engine, &id)
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/feedback",
    params(("id" = String, Path, description = "Session id")),
    request_body = FeedbackBody,
    responses(
        (status = 200, description = "Current state of the session", body = Session),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn submit_feedback_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<FeedbackBody>,
) -> Result<Json<Session>, (StatusCode, String)> {
    if let Some(rating) = body.rating {
        if !(1..=5).contains(&rating) {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("rating {} is outside 1..=5", rating),
            ));
        }
    }
    let mut engine = app_state.engine.lock().await;
    engine.submit_session_feedback(&id, body.role, body.rating, body.comment, body.submitted_at);
    current(&engine, &id)
}
