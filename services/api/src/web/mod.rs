pub mod activity;
pub mod onboarding;
pub mod requests;
pub mod rest;
pub mod scheduler;
pub mod sessions;
pub mod state;

use axum::http::StatusCode;

// Re-export the router builder so the binary only needs one import.
pub use rest::{build_app, router};

/// The 404 every lookup-by-id handler answers with.
pub fn not_found(kind: &str, id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{} {} not found", kind, id))
}
