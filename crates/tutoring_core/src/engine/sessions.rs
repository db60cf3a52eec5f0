//! Session lifecycle.
//!
//! ```text
//! awaiting_parent_approval --approve--> scheduled
//! scheduled --sweep: now >= end_at--> awaiting_notes
//! awaiting_notes --tutor note--> awaiting_feedback_prompts
//! awaiting_feedback_prompts --note AND both prompts--> completed
//! any non-terminal --cancel--> cancelled
//! ```
//!
//! Completion is never requested directly. `settle_completion` re-checks the
//! note/prompt/prompt condition after each of its inputs changes.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use super::WorkflowEngine;
use crate::calendar::replace_session_events;
use crate::domain::{
    FeedbackRecord, PromptDelivery, PromptRole, Role, Session, SessionFeedback, SessionStatus,
};
use crate::events::WorkflowEvent;

/// A pre-booked session loaded without going through a request.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionSeed {
    /// Synthetic id standing in for the originating request.
    pub request_id: String,
    pub parent_id: String,
    pub child_id: String,
    pub tutor_id: String,
    pub subject: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Flips a ready session to `completed`. Returns whether it did.
fn settle_completion(session: &mut Session, at: DateTime<Utc>, outbox: &mut Vec<WorkflowEvent>) -> bool {
    if session.status.is_terminal() || !session.completion_ready() {
        return false;
    }
    session.status = SessionStatus::Completed;
    session.completed_at = Some(at);
    info!(session_id = %session.id, "session completed");
    outbox.push(WorkflowEvent::SessionCompleted {
        session_id: session.id.clone(),
    });
    true
}

impl WorkflowEngine {
    fn session_mut(&mut self, session_id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == session_id)
    }

    /// Inserts a seeded, already-approved session and projects its calendar.
    /// Ignored if a session with the derived id exists.
    pub fn seed_session(&mut self, seed: SessionSeed) {
        let now = self.clock.now();
        let id = Session::id_for_request(&seed.request_id);
        if self.session(&id).is_some() {
            debug!(session_id = %id, "seed ignored: session already exists");
            return;
        }
        let session = Session {
            id,
            request_id: seed.request_id,
            parent_id: seed.parent_id,
            child_id: seed.child_id,
            tutor_id: seed.tutor_id,
            subject: seed.subject,
            start_at: seed.start_at,
            end_at: seed.end_at,
            status: SessionStatus::Scheduled,
            created_at: now,
            parent_approved_at: Some(now),
            tutor_note: None,
            tutor_note_submitted_at: None,
            feedback_prompts: PromptDelivery::default(),
            feedback: SessionFeedback::default(),
            completed_at: None,
            cancelled_at: None,
        };
        replace_session_events(&mut self.calendar_events, &session);
        self.sessions.push(session);
        self.recompute_actions(now);
    }

    pub fn approve_session(&mut self, session_id: &str, approved_at: Option<DateTime<Utc>>) {
        let at = self.at_or_now(approved_at);
        let Some(session) = self
            .session_mut(session_id)
            .filter(|s| s.status == SessionStatus::AwaitingParentApproval)
        else {
            debug!(session_id, "approve ignored: session unknown or not awaiting approval");
            return;
        };

        session.status = SessionStatus::Scheduled;
        session.parent_approved_at = Some(at);
        let event = WorkflowEvent::SessionApproved {
            session_id: session.id.clone(),
            tutor_id: session.tutor_id.clone(),
            child_id: session.child_id.clone(),
        };
        info!(session_id, "session approved");

        self.outbox.push(event);
        self.recompute_actions(at);
    }

    /// Moves a session that has not started yet to a new window and rebuilds
    /// its calendar entries.
    pub fn reschedule_session(
        &mut self,
        session_id: &str,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) {
        let now = self.clock.now();
        let Some(session) = self.session_mut(session_id).filter(|s| {
            matches!(
                s.status,
                SessionStatus::AwaitingParentApproval | SessionStatus::Scheduled
            )
        }) else {
            debug!(session_id, "reschedule ignored: session unknown or already underway");
            return;
        };

        session.start_at = start_at;
        session.end_at = end_at;
        let session = session.clone();
        info!(session_id, start_at = %start_at, "session rescheduled");

        replace_session_events(&mut self.calendar_events, &session);
        self.recompute_actions(now);
    }

    pub fn cancel_session(&mut self, session_id: &str, cancelled_at: Option<DateTime<Utc>>) {
        let at = self.at_or_now(cancelled_at);
        let Some(session) = self
            .session_mut(session_id)
            .filter(|s| !s.status.is_terminal())
        else {
            debug!(session_id, "cancel ignored: session unknown or finished");
            return;
        };

        session.status = SessionStatus::Cancelled;
        session.cancelled_at = Some(at);
        info!(session_id, "session cancelled");

        self.outbox.push(WorkflowEvent::SessionCancelled {
            session_id: session_id.to_string(),
        });
        self.recompute_actions(at);
    }

    /// Moves finished sessions to `awaiting_notes` and completes any session
    /// whose note and prompts are all in.
    pub fn run_session_lifecycle_sweep(&mut self, now: Option<DateTime<Utc>>) {
        let now = self.at_or_now(now);
        let mut ended = 0usize;
        let mut completed = 0usize;

        for session in self.sessions.iter_mut() {
            match session.status {
                SessionStatus::Scheduled if session.end_at <= now => {
                    session.status = SessionStatus::AwaitingNotes;
                    self.outbox.push(WorkflowEvent::SessionEnded {
                        session_id: session.id.clone(),
                        tutor_id: session.tutor_id.clone(),
                    });
                    self.outbox.push(WorkflowEvent::FeedbackPromptsDue {
                        session_id: session.id.clone(),
                        parent_id: session.parent_id.clone(),
                        child_id: session.child_id.clone(),
                    });
                    ended += 1;
                }
                SessionStatus::AwaitingFeedbackPrompts => {
                    if settle_completion(session, now, &mut self.outbox) {
                        completed += 1;
                    }
                }
                _ => {}
            }
        }

        if ended > 0 || completed > 0 {
            info!(ended, completed, "session lifecycle sweep applied");
        }
        self.recompute_actions(now);
    }

    pub fn submit_tutor_note(
        &mut self,
        session_id: &str,
        note: String,
        submitted_at: Option<DateTime<Utc>>,
    ) {
        let at = self.at_or_now(submitted_at);
        let Some(session) = self
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id && !s.status.is_terminal())
        else {
            debug!(session_id, "tutor note ignored: session unknown or finished");
            return;
        };

        session.tutor_note = Some(note);
        session.tutor_note_submitted_at = Some(at);
        session.status = SessionStatus::AwaitingFeedbackPrompts;
        info!(session_id, "tutor note submitted");

        settle_completion(session, at, &mut self.outbox);
        self.recompute_actions(at);
    }

    /// Records that a feedback prompt reached its recipient. Without a tutor
    /// note the session is held in `awaiting_notes`.
    pub fn deliver_feedback_prompt(
        &mut self,
        session_id: &str,
        role: PromptRole,
        delivered_at: Option<DateTime<Utc>>,
    ) {
        let at = self.at_or_now(delivered_at);
        let Some(session) = self
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id && !s.status.is_terminal())
        else {
            debug!(session_id, "prompt delivery ignored: session unknown or finished");
            return;
        };

        session.feedback_prompts.mark(role, at);
        session.status = if session.tutor_note_submitted_at.is_some() {
            SessionStatus::AwaitingFeedbackPrompts
        } else {
            SessionStatus::AwaitingNotes
        };
        debug!(session_id, role = ?role, status = ?session.status, "feedback prompt delivered");

        settle_completion(session, at, &mut self.outbox);
        self.recompute_actions(at);
    }

    /// Stores a participant's feedback. Does not touch the session's status.
    pub fn submit_session_feedback(
        &mut self,
        session_id: &str,
        role: Role,
        rating: Option<u8>,
        comment: Option<String>,
        submitted_at: Option<DateTime<Utc>>,
    ) {
        let at = self.at_or_now(submitted_at);
        let Some(session) = self.session_mut(session_id) else {
            debug!(session_id, "feedback ignored: session unknown");
            return;
        };
        session.feedback.set(
            role,
            FeedbackRecord {
                rating,
                comment,
                submitted_at: at,
            },
        );
        debug!(session_id, role = %role, "session feedback stored");
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use chrono::Duration;

    /// An accepted request's session id.
    fn accepted(engine: &mut WorkflowEngine) -> String {
        let req = engine.create_request(math_request());
        engine.accept_request(&req.id, None, None);
        Session::id_for_request(&req.id)
    }

    fn status(engine: &WorkflowEngine, id: &str) -> SessionStatus {
        engine.session(id).unwrap().status
    }

    #[test]
    fn approve_only_from_awaiting_approval() {
        let (mut engine, _clock) = engine();
        let id = accepted(&mut engine);

        engine.approve_session(&id, Some(t0() + Duration::hours(3)));
        assert_eq!(status(&engine, &id), SessionStatus::Scheduled);
        assert_eq!(
            engine.session(&id).unwrap().parent_approved_at,
            Some(t0() + Duration::hours(3))
        );

        engine.approve_session(&id, Some(t0() + Duration::hours(4)));
        assert_eq!(
            engine.session(&id).unwrap().parent_approved_at,
            Some(t0() + Duration::hours(3))
        );
    }

    #[test]
    fn sweep_ends_scheduled_sessions_after_end_time() {
        let (mut engine, _clock) = engine();
        let id = accepted(&mut engine);
        engine.approve_session(&id, None);
        let end = engine.session(&id).unwrap().end_at;
        engine.drain_events();

        engine.run_session_lifecycle_sweep(Some(end - Duration::minutes(1)));
        assert_eq!(status(&engine, &id), SessionStatus::Scheduled);

        engine.run_session_lifecycle_sweep(Some(end));
        assert_eq!(status(&engine, &id), SessionStatus::AwaitingNotes);
        let kinds: Vec<&str> = engine.drain_events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["session_ended", "feedback_prompts_due"]);

        engine.run_session_lifecycle_sweep(Some(end + Duration::hours(1)));
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn sweep_leaves_unapproved_sessions_alone() {
        let (mut engine, _clock) = engine();
        let id = accepted(&mut engine);
        engine.run_session_lifecycle_sweep(Some(t0() + Duration::days(30)));
        assert_eq!(status(&engine, &id), SessionStatus::AwaitingParentApproval);
    }

    #[test]
    fn note_after_prompts_completes() {
        let (mut engine, _clock) = engine();
        let id = accepted(&mut engine);
        engine.deliver_feedback_prompt(&id, PromptRole::Parent, None);
        engine.deliver_feedback_prompt(&id, PromptRole::Child, None);
        assert_eq!(status(&engine, &id), SessionStatus::AwaitingNotes);

        let at = t0() + Duration::days(3);
        engine.submit_tutor_note(&id, "Worked on fractions".into(), Some(at));
        let session = engine.session(&id).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.completed_at, Some(at));
    }

    #[test]
    fn finished_sessions_reject_notes_and_prompts() {
        let (mut engine, _clock) = engine();
        let id = accepted(&mut engine);
        engine.cancel_session(&id, None);
        let before = engine.snapshot();

        engine.submit_tutor_note(&id, "late".into(), None);
        engine.deliver_feedback_prompt(&id, PromptRole::Parent, None);
        engine.approve_session(&id, None);
        engine.cancel_session(&id, None);

        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn feedback_is_stored_regardless_of_status() {
        let (mut engine, _clock) = engine();
        let id = accepted(&mut engine);
        engine.cancel_session(&id, None);

        engine.submit_session_feedback(&id, Role::Parent, Some(4), Some("Helpful".into()), None);
        let session = engine.session(&id).unwrap();
        assert_eq!(session.status, SessionStatus::Cancelled);
        let record = session.feedback.get(Role::Parent).unwrap();
        assert_eq!(record.rating, Some(4));
        assert_eq!(record.submitted_at, t0());
        assert!(session.feedback.get(Role::Tutor).is_none());
    }

    #[test]
    fn reschedule_regenerates_calendar() {
        let (mut engine, _clock) = engine();
        let id = accepted(&mut engine);
        let start = t0() + Duration::days(5);
        engine.reschedule_session(&id, start, start + Duration::minutes(45));

        let events: Vec<_> = engine
            .calendar_events()
            .iter()
            .filter(|e| e.session_id == id)
            .collect();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.start_at == start));
        assert_eq!(engine.session(&id).unwrap().end_at, start + Duration::minutes(45));
    }

    #[test]
    fn reschedule_after_end_is_ignored() {
        let (mut engine, _clock) = engine();
        let id = accepted(&mut engine);
        engine.approve_session(&id, None);
        engine.run_session_lifecycle_sweep(Some(t0() + Duration::days(3)));
        let before = engine.snapshot();

        engine.reschedule_session(&id, t0() + Duration::days(9), t0() + Duration::days(9));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn seeded_sessions_are_scheduled_with_calendar() {
        let (mut engine, _clock) = engine();
        let seed = SessionSeed {
            request_id: "seed-1".into(),
            parent_id: "parent-9".into(),
            child_id: "child-9".into(),
            tutor_id: "tutor-3".into(),
            subject: "English".into(),
            start_at: t0() - Duration::hours(2),
            end_at: t0() - Duration::hours(1),
        };
        engine.seed_session(seed.clone());
        engine.seed_session(seed);

        assert_eq!(engine.sessions().len(), 1);
        assert_eq!(engine.calendar_events().len(), 3);
        let id = Session::id_for_request("seed-1");
        assert_eq!(status(&engine, &id), SessionStatus::Scheduled);

        engine.run_session_lifecycle_sweep(None);
        assert_eq!(status(&engine, &id), SessionStatus::AwaitingNotes);
        assert_eq!(engine.actions_for(Role::Tutor, "tutor-3").len(), 1);
    }
}
