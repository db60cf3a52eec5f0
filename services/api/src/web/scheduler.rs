//! services/api/src/web/scheduler.rs
//!
//! The periodic worker that drives time-based transitions. Each tick runs the
//! request timing sweep and the session lifecycle sweep with the engine's
//! clock, then hands every recorded workflow event to the notifier.

use crate::web::state::AppState;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tutoring_core::events::WorkflowEvent;
use tutoring_core::ports::NotificationService;
use tutoring_core::PromptRole;
use utoipa::ToSchema;

/// What a single tick did.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SweepReport {
    pub events_dispatched: usize,
    pub delivery_failures: usize,
    /// Sessions whose parent and child prompts were confirmed this tick.
    pub prompts_confirmed: usize,
}

/// Runs both sweeps once and flushes the resulting events.
pub async fn run_sweep_tick(app_state: &AppState) -> SweepReport {
    let events = {
        let mut engine = app_state.engine.lock().await;
        let now = engine.now();
        engine.run_request_timing_sweep(Some(now));
        engine.run_session_lifecycle_sweep(Some(now));
        engine.drain_events()
    };
    dispatch_events(app_state, events).await
}

/// Sends events to the notifier without holding the engine lock.
///
/// Feedback prompts are only marked delivered once the notifier has
/// succeeded; a failed delivery is logged and not retried.
pub async fn dispatch_events(app_state: &AppState, events: Vec<WorkflowEvent>) -> SweepReport {
    let mut report = SweepReport::default();

    for event in events {
        match app_state.notifier.notify(&event).await {
            Ok(()) => {
                report.events_dispatched += 1;
                if let WorkflowEvent::FeedbackPromptsDue { session_id, .. } = &event {
                    let mut engine = app_state.engine.lock().await;
                    engine.deliver_feedback_prompt(session_id, PromptRole::Parent, None);
                    engine.deliver_feedback_prompt(session_id, PromptRole::Child, None);
                    report.prompts_confirmed += 1;
                }
            }
            Err(e) => {
                report.delivery_failures += 1;
                warn!(kind = event.kind(), subject = event.subject_id(), "Notification failed: {}", e);
            }
        }
    }

    // Prompt confirmations can complete sessions, which records more events.
    let follow_up = app_state.engine.lock().await.drain_events();
    for event in follow_up {
        if let Err(e) = app_state.notifier.notify(&event).await {
            report.delivery_failures += 1;
            warn!(kind = event.kind(), "Notification failed: {}", e);
        } else {
            report.events_dispatched += 1;
        }
    }

    report
}

/// The long-running sweep loop. Stops when the token is cancelled.
pub async fn sweep_loop(
    app_state: Arc<AppState>,
    every: Duration,
    cancellation_token: CancellationToken,
) {
    info!("Sweep scheduler started, running every {:?}.", every);
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Sweep scheduler cancelled.");
                return;
            }
            _ = ticker.tick() => {
                let report = run_sweep_tick(&app_state).await;
                if report.delivery_failures > 0 {
                    error!(failures = report.delivery_failures, "Sweep tick finished with delivery failures.");
                } else if report.events_dispatched > 0 {
                    info!(events = report.events_dispatched, "Sweep tick dispatched notifications.");
                }
            }
        }
    }
}
