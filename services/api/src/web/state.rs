//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use tokio::sync::Mutex;
use tutoring_core::ports::NotificationService;
use tutoring_core::WorkflowEngine;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The engine sits behind one lock: every mutation, including its calendar and
/// next-best-action rebuild, finishes before another caller can look at it.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<WorkflowEngine>>,
    pub config: Arc<Config>,
    pub notifier: Arc<dyn NotificationService>,
}

impl AppState {
    pub fn new(
        engine: WorkflowEngine,
        config: Arc<Config>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            config,
            notifier,
        }
    }
}
