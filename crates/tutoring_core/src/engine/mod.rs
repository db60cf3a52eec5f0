//! crates/tutoring_core/src/engine/mod.rs
//!
//! The workflow coordinator. `WorkflowEngine` owns every piece of mutable
//! state; callers only reach it through the operations defined here and in
//! the `requests`, `sessions` and `exercises` sub-modules.
//!
//! Every mutating operation runs to completion before returning and ends by
//! rebuilding the next-best-action list from scratch. Guard violations
//! (unknown id, wrong status) are silent no-ops: nothing changes, no event is
//! recorded and the caller gets no error. They are logged at `debug`.
//!
//! Mutations take `&mut self`, so a host sharing the engine across tasks must
//! put it behind a single lock.

mod exercises;
mod requests;
mod sessions;

pub use requests::NewRequest;
pub use sessions::SessionSeed;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

use crate::actions::derive_actions;
use crate::catalog::TutorCatalog;
use crate::digest::generate_digests;
use crate::domain::{
    CalendarEvent, ExerciseTask, NextBestAction, OnboardingState, Role, Session,
    TutoringRequest, WeeklyDigest,
};
use crate::events::WorkflowEvent;
use crate::onboarding::OnboardingTracker;
use crate::ports::{Clock, SystemClock};

pub struct WorkflowEngine {
    clock: Arc<dyn Clock>,
    catalog: TutorCatalog,
    requests: Vec<TutoringRequest>,
    sessions: Vec<Session>,
    calendar_events: Vec<CalendarEvent>,
    exercises: Vec<ExerciseTask>,
    /// Fallback suggestions by request id, mirrored on the request itself.
    fallbacks: HashMap<String, Vec<String>>,
    next_best_actions: Vec<NextBestAction>,
    digests: Vec<WeeklyDigest>,
    onboarding: OnboardingTracker,
    outbox: Vec<WorkflowEvent>,
}

/// A point-in-time copy of all workflow state, for read models and comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkflowSnapshot {
    pub requests: Vec<TutoringRequest>,
    pub sessions: Vec<Session>,
    pub calendar_events: Vec<CalendarEvent>,
    pub exercises: Vec<ExerciseTask>,
    pub fallbacks: BTreeMap<String, Vec<String>>,
    pub next_best_actions: Vec<NextBestAction>,
    pub digests: Vec<WeeklyDigest>,
}

impl WorkflowEngine {
    pub fn new(catalog: TutorCatalog, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            catalog,
            requests: Vec::new(),
            sessions: Vec::new(),
            calendar_events: Vec::new(),
            exercises: Vec::new(),
            fallbacks: HashMap::new(),
            next_best_actions: Vec::new(),
            digests: Vec::new(),
            onboarding: OnboardingTracker::new(),
            outbox: Vec::new(),
        }
    }

    /// An engine reading the wall clock.
    pub fn with_system_clock(catalog: TutorCatalog) -> Self {
        Self::new(catalog, Arc::new(SystemClock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn at_or_now(&self, at: Option<DateTime<Utc>>) -> DateTime<Utc> {
        at.unwrap_or_else(|| self.clock.now())
    }

    /// Replaces the action list wholesale.
    fn recompute_actions(&mut self, now: DateTime<Utc>) {
        self.next_best_actions = derive_actions(&self.requests, &self.sessions, &self.exercises, now);
        debug!(count = self.next_best_actions.len(), "next-best-actions recomputed");
    }

    //=====================================================================================
    // Read Models
    //=====================================================================================

    pub fn catalog(&self) -> &TutorCatalog {
        &self.catalog
    }

    pub fn request(&self, request_id: &str) -> Option<&TutoringRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }

    pub fn requests(&self) -> &[TutoringRequest] {
        &self.requests
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn calendar_events(&self) -> &[CalendarEvent] {
        &self.calendar_events
    }

    /// One owner's calendar, earliest first.
    pub fn calendar_for(&self, role: Role, owner_id: &str) -> Vec<CalendarEvent> {
        let mut events: Vec<CalendarEvent> = self
            .calendar_events
            .iter()
            .filter(|e| e.role == role && e.owner_id == owner_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start_at);
        events
    }

    pub fn exercises(&self) -> &[ExerciseTask] {
        &self.exercises
    }

    pub fn fallback_tutors(&self, request_id: &str) -> Option<&[String]> {
        self.fallbacks.get(request_id).map(Vec::as_slice)
    }

    pub fn next_best_actions(&self) -> &[NextBestAction] {
        &self.next_best_actions
    }

    pub fn actions_for(&self, role: Role, target_id: &str) -> Vec<NextBestAction> {
        self.next_best_actions
            .iter()
            .filter(|a| a.role == role && a.target_id == target_id)
            .cloned()
            .collect()
    }

    pub fn digests(&self) -> &[WeeklyDigest] {
        &self.digests
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            requests: self.requests.clone(),
            sessions: self.sessions.clone(),
            calendar_events: self.calendar_events.clone(),
            exercises: self.exercises.clone(),
            fallbacks: self
                .fallbacks
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            next_best_actions: self.next_best_actions.clone(),
            digests: self.digests.clone(),
        }
    }

    /// Hands over every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<WorkflowEvent> {
        std::mem::take(&mut self.outbox)
    }

    //=====================================================================================
    // Weekly Digests
    //=====================================================================================

    /// Builds the digests for the week starting at `week_start_at`.
    /// A digest with the same (role, target, week) replaces the stored one.
    pub fn generate_weekly_digests(
        &mut self,
        week_start_at: DateTime<Utc>,
        generated_at: Option<DateTime<Utc>>,
    ) -> Vec<WeeklyDigest> {
        let generated_at = self.at_or_now(generated_at);
        let fresh = generate_digests(
            &self.requests,
            &self.sessions,
            &self.exercises,
            week_start_at,
            generated_at,
        );
        for digest in &fresh {
            self.digests.retain(|d| d.id != digest.id);
            self.digests.push(digest.clone());
        }
        info!(count = fresh.len(), week = %week_start_at, "weekly digests generated");
        self.recompute_actions(generated_at);
        fresh
    }

    //=====================================================================================
    // Onboarding
    //=====================================================================================

    pub fn onboarding(&self, user_id: &str, role: Role) -> OnboardingState {
        self.onboarding.get(user_id, role)
    }

    pub fn record_onboarding_step(
        &mut self,
        user_id: &str,
        role: Role,
        step: &str,
        at: Option<DateTime<Utc>>,
    ) -> OnboardingState {
        let at = self.at_or_now(at);
        self.onboarding.record_step(user_id, role, step, at)
    }

    pub fn complete_onboarding(
        &mut self,
        user_id: &str,
        role: Role,
        at: Option<DateTime<Utc>>,
    ) -> OnboardingState {
        let at = self.at_or_now(at);
        self.onboarding.complete(user_id, role, at)
    }

    pub fn reset_onboarding(&mut self, user_id: &str, role: Role) -> bool {
        self.onboarding.reset(user_id, role)
    }
}
