//! services/api/src/web/onboarding.rs
//!
//! Onboarding progress per user and role.

use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tutoring_core::{OnboardingState, Role};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct OnboardingStepBody {
    pub step: String,
    pub at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct OnboardingCompleteBody {
    pub at: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/onboarding/{role}/{user_id}",
    params(
        ("role" = Role, Path, description = "parent, child or tutor"),
        ("user_id" = String, Path, description = "The user's id")
    ),
    responses((status = 200, description = "Onboarding progress", body = OnboardingState))
)]
pub async fn get_onboarding_handler(
    State(app_state): State<Arc<AppState>>,
    Path((role, user_id)): Path<(Role, String)>,
) -> Json<OnboardingState> {
    Json(app_state.engine.lock().await.onboarding(&user_id, role))
}

/// Record a finished onboarding step. Repeated steps are kept once.
#[utoipa::path(
    post,
    path = "/onboarding/{role}/{user_id}/steps",
    params(
        ("role" = Role, Path, description = "parent, child or tutor"),
        ("user_id" = String, Path, description = "The user's id")
    ),
    request_body = OnboardingStepBody,
    responses(
        (status = 200, description = "Onboarding progress", body = OnboardingState),
        (status = 400, description = "Empty step name")
    )
)]
pub async fn record_step_handler(
    State(app_state): State<Arc<AppState>>,
    Path((role, user_id)): Path<(Role, String)>,
    Json(body): Json<OnboardingStepBody>,
) -> Result<Json<OnboardingState>, (StatusCode, String)> {
    let step = body.step.trim();
    if step.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "step must not be empty".to_string()));
    }
    let state = app_state
        .engine
        .lock()
        .await
        .record_onboarding_step(&user_id, role, step, body.at);
    Ok(Json(state))
}

#[utoipa::path(
    post,
    path = "/onboarding/{role}/{user_id}/complete",
    params(
        ("role" = Role, Path, description = "parent, child or tutor"),
        ("user_id" = String, Path, description = "The user's id")
    ),
    request_body = OnboardingCompleteBody,
    responses((status = 200, description = "Onboarding progress", body = OnboardingState))
)]
pub async fn complete_onboarding_handler(
    State(app_state): State<Arc<AppState>>,
    Path((role, user_id)): Path<(Role, String)>,
    Json(body): Json<OnboardingCompleteBody>,
) -> Json<OnboardingState> {
    Json(
        app_state
            .engine
            .lock()
            .await
            .complete_onboarding(&user_id, role, body.at),
    )
}

/// Forget a user's progress in one role.
#[utoipa::path(
    delete,
    path = "/onboarding/{role}/{user_id}",
    params(
        ("role" = Role, Path, description = "parent, child or tutor"),
        ("user_id" = String, Path, description = "The user's id")
    ),
    responses(
        (status = 204, description = "Progress removed"),
        (status = 404, description = "Nothing was stored for this user")
    )
)]
pub async fn reset_onboarding_handler(
    State(app_state): State<Arc<AppState>>,
    Path((role, user_id)): Path<(Role, String)>,
) -> StatusCode {
    if app_state.engine.lock().await.reset_onboarding(&user_id, role) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
