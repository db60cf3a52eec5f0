//! services/api/src/web/requests.rs
//!
//! Handlers for the tutoring-request lifecycle. Transition endpoints keep the
//! engine's no-op contract: they answer with the request's current state
//! whether or not the transition applied, and 404 only for unknown ids.

use crate::web::{not_found, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tutoring_core::{NewRequest, TutoringRequest};
use utoipa::ToSchema;

//=========================================================================================
// Payload Structs
//=========================================================================================

/// Optional replacement for the preferred session window.
#[derive(Deserialize, Default, ToSchema)]
pub struct AcceptRequestBody {
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct DeclineRequestBody {
    pub reason: Option<String>,
}

fn validate_new_request(new: &NewRequest) -> Result<(), (StatusCode, String)> {
    let ids = [
        ("parent_id", &new.parent_id),
        ("child_id", &new.child_id),
        ("tutor_id", &new.tutor_id),
        ("subject", &new.subject),
    ];
    if let Some((field, _)) = ids.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err((StatusCode::BAD_REQUEST, format!("{} must not be empty", field)));
    }
    if new.preferred_end_at <= new.preferred_start_at {
        return Err((
            StatusCode::BAD_REQUEST,
            "preferred_end_at must be after preferred_start_at".to_string(),
        ));
    }
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a tutoring request.
#[utoipa::path(
    post,
    path = "/requests",
    request_body = NewRequest,
    responses(
        (status = 201, description = "Request created", body = TutoringRequest),
        (status = 400, description = "Invalid request window or empty ids")
    )
)]
pub async fn create_request_handler(
    State(app_state): State<Arc<AppState>>,
    Json(new): Json<NewRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_new_request(&new)?;
    let request = app_state.engine.lock().await.create_request(new);
    Ok((StatusCode::CREATED, Json(request)))
}

/// Read a request, including any fallback tutor suggestions.
#[utoipa::path(
    get,
    path = "/requests/{id}",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "The request", body = TutoringRequest),
        (status = 404, description = "Unknown request")
    )
)]
pub async fn get_request_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TutoringRequest>, (StatusCode, String)> {
    let engine = app_state.engine.lock().await;
    engine
        .request(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("request", &id))
}

/// Accept a pending request, opening a session that awaits parent approval.
#[utoipa::path(
    post,
    path = "/requests/{id}/accept",
    params(("id" = String, Path, description = "Request id")),
    request_body = AcceptRequestBody,
    responses(
        (status = 200, description = "Current state of the request", body = TutoringRequest),
        (status = 400, description = "Inverted session window"),
        (status = 404, description = "Unknown request")
    )
)]
pub async fn accept_request_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AcceptRequestBody>,
) -> Result<Json<TutoringRequest>, (StatusCode, String)> {
    if let (Some(start), Some(end)) = (body.start_at, body.end_at) {
        if end <= start {
            return Err((
                StatusCode::BAD_REQUEST,
                "end_at must be after start_at".to_string(),
            ));
        }
    }
    let mut engine = app_state.engine.lock().await;
    engine.accept_request(&id, body.start_at, body.end_at);
    engine
        .request(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("request", &id))
}

/// Decline a pending request; fallback tutors are attached to the response.
#[utoipa::path(
    post,
    path = "/requests/{id}/decline",
    params(("id" = String, Path, description = "Request id")),
    request_body = DeclineRequestBody,
    responses(
        (status = 200, description = "Current state of the request", body = TutoringRequest),
        (status = 404, description = "Unknown request")
    )
)]
pub async fn decline_request_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<DeclineRequestBody>,
) -> Result<Json<TutoringRequest>, (StatusCode, String)> {
    let reason = body.reason.filter(|r| !r.trim().is_empty());
    let mut engine = app_state.engine.lock().await;
    engine.decline_request(&id, reason);
    engine
        .request(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("request", &id))
}
