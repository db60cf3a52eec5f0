//! services/api/src/web/activity.rs
//!
//! Handlers for exercises and for the derived views the UI reads:
//! next-best-actions, calendars, weekly digests, plus a manual sweep trigger.

use crate::web::{
    scheduler::{run_sweep_tick, SweepReport},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tutoring_core::{
    CalendarEvent, ExerciseTask, NextBestAction, Role, WeeklyDigest, WorkflowSnapshot,
};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct AssignExerciseBody {
    pub child_id: String,
    pub title: String,
    pub due_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct CompleteExerciseBody {
    pub child_id: String,
    pub title: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActionQuery {
    pub role: Option<Role>,
    pub target_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct GenerateDigestsBody {
    pub week_start_at: DateTime<Utc>,
    pub generated_at: Option<DateTime<Utc>>,
}

fn exercise_of(
    exercises: &[ExerciseTask],
    child_id: &str,
    exercise_id: &str,
) -> Result<ExerciseTask, (StatusCode, String)> {
    exercises
        .iter()
        .find(|e| e.child_id == child_id && e.id == exercise_id)
        .cloned()
        .ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("exercise {} missing after upsert", exercise_id),
            )
        })
}

//=========================================================================================
// Exercise Handlers
//=========================================================================================

/// Assign (or update) an exercise for a child.
#[utoipa::path(
    put,
    path = "/exercises/{id}",
    params(("id" = String, Path, description = "Exercise id, unique per child")),
    request_body = AssignExerciseBody,
    responses(
        (status = 200, description = "The stored exercise", body = ExerciseTask),
        (status = 400, description = "Empty child id or title")
    )
)]
pub async fn assign_exercise_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AssignExerciseBody>,
) -> Result<Json<ExerciseTask>, (StatusCode, String)> {
    if body.child_id.trim().is_empty() || body.title.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "child_id and title must not be empty".to_string(),
        ));
    }
    let mut engine = app_state.engine.lock().await;
    engine.assign_exercise(&body.child_id, &id, &body.title, body.due_at);
    exercise_of(engine.exercises(), &body.child_id, &id).map(Json)
}

/// Mark an exercise done, creating it if it was never assigned.
#[utoipa::path(
    post,
    path = "/exercises/{id}/complete",
    params(("id" = String, Path, description = "Exercise id, unique per child")),
    request_body = CompleteExerciseBody,
    responses(
        (status = 200, description = "The stored exercise", body = ExerciseTask),
        (status = 400, description = "Empty child id")
    )
)]
pub async fn complete_exercise_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CompleteExerciseBody>,
) -> Result<Json<ExerciseTask>, (StatusCode, String)> {
    if body.child_id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "child_id must not be empty".to_string()));
    }
    let mut engine = app_state.engine.lock().await;
    engine.complete_exercise(&body.child_id, &id, body.title, body.completed_at);
    exercise_of(engine.exercises(), &body.child_id, &id).map(Json)
}

//=========================================================================================
// Derived Views
//=========================================================================================

/// Current next-best-actions, highest priority first.
#[utoipa::path(
    get,
    path = "/actions",
    params(ActionQuery),
    responses((status = 200, description = "Actions", body = [NextBestAction]))
)]
pub async fn list_actions_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ActionQuery>,
) -> Json<Vec<NextBestAction>> {
    let engine = app_state.engine.lock().await;
    let actions = engine
        .next_best_actions()
        .iter()
        .filter(|a| query.role.map_or(true, |role| a.role == role))
        .filter(|a| query.target_id.as_deref().map_or(true, |t| a.target_id == t))
        .cloned()
        .collect();
    Json(actions)
}

/// One participant's calendar, earliest first.
#[utoipa::path(
    get,
    path = "/calendar/{role}/{owner_id}",
    params(
        ("role" = Role, Path, description = "parent, child or tutor"),
        ("owner_id" = String, Path, description = "The participant's id")
    ),
    responses((status = 200, description = "Calendar entries", body = [CalendarEvent]))
)]
pub async fn calendar_handler(
    State(app_state): State<Arc<AppState>>,
    Path((role, owner_id)): Path<(Role, String)>,
) -> Json<Vec<CalendarEvent>> {
    Json(app_state.engine.lock().await.calendar_for(role, &owner_id))
}

/// Generate (or regenerate) the digests of one week.
#[utoipa::path(
    post,
    path = "/digests",
    request_body = GenerateDigestsBody,
    responses((status = 201, description = "Digests for the week", body = [WeeklyDigest]))
)]
pub async fn generate_digests_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<GenerateDigestsBody>,
) -> impl IntoResponse {
    let digests = app_state
        .engine
        .lock()
        .await
        .generate_weekly_digests(body.week_start_at, body.generated_at);
    (StatusCode::CREATED, Json(digests))
}

#[utoipa::path(
    get,
    path = "/digests",
    responses((status = 200, description = "All stored digests", body = [WeeklyDigest]))
)]
pub async fn list_digests_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<WeeklyDigest>> {
    Json(app_state.engine.lock().await.digests().to_vec())
}

/// Run both sweeps now instead of waiting for the scheduler.
#[utoipa::path(
    post,
    path = "/sweeps",
    responses((status = 200, description = "What the sweep did", body = SweepReport))
)]
pub async fn run_sweeps_handler(State(app_state): State<Arc<AppState>>) -> Json<SweepReport> {
    Json(run_sweep_tick(&app_state).await)
}

/// Everything the engine holds, for debugging and UI bootstrapping.
#[utoipa::path(
    get,
    path = "/state",
    responses((status = 200, description = "Workflow snapshot", body = WorkflowSnapshot))
)]
pub async fn snapshot_handler(State(app_state): State<Arc<AppState>>) -> Json<WorkflowSnapshot> {
    Json(app_state.engine.lock().await.snapshot())
}
