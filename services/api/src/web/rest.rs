//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the router that
//! wires every REST handler to its path.

use crate::{
    error::ApiError,
    web::{activity, onboarding, requests, scheduler::SweepReport, sessions, state::AppState},
};
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tutoring_core::{
    ActionType, CalendarEvent, ExerciseTask, FeedbackRecord, NewRequest, NextBestAction,
    OnboardingState, PromptDelivery, PromptRole, RequestStatus, Role, Session, SessionFeedback,
    SessionStatus, TutoringRequest, WeeklyDigest, WorkflowSnapshot,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        requests::create_request_handler,
        requests::get_request_handler,
        requests::accept_request_handler,
        requests::decline_request_handler,
        sessions::get_session_handler,
        sessions::approve_session_handler,
        sessions::reschedule_session_handler,
        sessions::cancel_session_handler,
        sessions::submit_note_handler,
        sessions::deliver_prompt_handler,
        sessions::submit_feedback_handler,
        activity::assign_exercise_handler,
        activity::complete_exercise_handler,
        activity::list_actions_handler,
        activity::calendar_handler,
        activity::generate_digests_handler,
        activity::list_digests_handler,
        activity::run_sweeps_handler,
        activity::snapshot_handler,
        onboarding::get_onboarding_handler,
        onboarding::record_step_handler,
        onboarding::complete_onboarding_handler,
        onboarding::reset_onboarding_handler,
    ),
    components(
        schemas(
            NewRequest, TutoringRequest, RequestStatus, Session, SessionStatus, PromptRole,
            PromptDelivery, SessionFeedback, FeedbackRecord, Role, CalendarEvent, ExerciseTask,
            ActionType, NextBestAction, WeeklyDigest, OnboardingState, WorkflowSnapshot,
            SweepReport,
            requests::AcceptRequestBody, requests::DeclineRequestBody,
            sessions::TimestampBody, sessions::RescheduleBody, sessions::TutorNoteBody,
            sessions::FeedbackBody,
            activity::AssignExerciseBody, activity::CompleteExerciseBody,
            activity::GenerateDigestsBody,
            onboarding::OnboardingStepBody, onboarding::OnboardingCompleteBody,
        )
    ),
    tags(
        (name = "Tutoring Workflow API", description = "Requests, sessions and the views derived from them.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// All REST routes, without CORS or the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/requests", post(requests::create_request_handler))
        .route("/requests/{id}", get(requests::get_request_handler))
        .route("/requests/{id}/accept", post(requests::accept_request_handler))
        .route("/requests/{id}/decline", post(requests::decline_request_handler))
        .route("/sessions/{id}", get(sessions::get_session_handler))
        .route("/sessions/{id}/approve", post(sessions::approve_session_handler))
        .route("/sessions/{id}/reschedule", post(sessions::reschedule_session_handler))
        .route("/sessions/{id}/cancel", post(sessions::cancel_session_handler))
        .route("/sessions/{id}/notes", post(sessions::submit_note_handler))
        .route("/sessions/{id}/prompts/{role}", post(sessions::deliver_prompt_handler))
        .route("/sessions/{id}/feedback", post(sessions::submit_feedback_handler))
        .route("/exercises/{id}", put(activity::assign_exercise_handler))
        .route("/exercises/{id}/complete", post(activity::complete_exercise_handler))
        .route("/actions", get(activity::list_actions_handler))
        .route("/calendar/{role}/{owner_id}", get(activity::calendar_handler))
        .route(
            "/digests",
            get(activity::list_digests_handler).post(activity::generate_digests_handler),
        )
        .route("/sweeps", post(activity::run_sweeps_handler))
        .route("/state", get(activity::snapshot_handler))
        .route(
            "/onboarding/{role}/{user_id}",
            get(onboarding::get_onboarding_handler).delete(onboarding::reset_onboarding_handler),
        )
        .route("/onboarding/{role}/{user_id}/steps", post(onboarding::record_step_handler))
        .route(
            "/onboarding/{role}/{user_id}/complete",
            post(onboarding::complete_onboarding_handler),
        )
        .with_state(app_state)
}

/// The complete application: REST routes behind CORS, plus the Swagger UI.
pub fn build_app(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .merge(router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
