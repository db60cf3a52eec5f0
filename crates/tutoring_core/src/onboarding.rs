//! crates/tutoring_core/src/onboarding.rs
//!
//! Per-user onboarding progress, keyed by user id and role. The workflow
//! itself never reads this; it is kept alongside for the UI.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::domain::{OnboardingState, Role};

#[derive(Debug, Clone, Default)]
pub struct OnboardingTracker {
    entries: HashMap<(String, Role), OnboardingState>,
}

impl OnboardingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current progress; users never seen start with nothing completed.
    pub fn get(&self, user_id: &str, role: Role) -> OnboardingState {
        self.entries
            .get(&(user_id.to_string(), role))
            .cloned()
            .unwrap_or_else(|| OnboardingState::new(user_id, role))
    }

    pub fn record_step(
        &mut self,
        user_id: &str,
        role: Role,
        step: &str,
        at: DateTime<Utc>,
    ) -> OnboardingState {
        let state = self.entry(user_id, role);
        if !state.completed_steps.iter().any(|s| s == step) {
            state.completed_steps.push(step.to_string());
            state.updated_at = Some(at);
        }
        state.clone()
    }

    /// Stamps completion once; later calls keep the first stamp.
    pub fn complete(&mut self, user_id: &str, role: Role, at: DateTime<Utc>) -> OnboardingState {
        let state = self.entry(user_id, role);
        if state.completed_at.is_none() {
            state.completed_at = Some(at);
            state.updated_at = Some(at);
        }
        state.clone()
    }

    /// Forgets the user's progress in this role. Returns whether anything was stored.
    pub fn reset(&mut self, user_id: &str, role: Role) -> bool {
        self.entries.remove(&(user_id.to_string(), role)).is_some()
    }

    fn entry(&mut self, user_id: &str, role: Role) -> &mut OnboardingState {
        self.entries
            .entry((user_id.to_string(), role))
            .or_insert_with(|| OnboardingState::new(user_id, role))
    }
}
