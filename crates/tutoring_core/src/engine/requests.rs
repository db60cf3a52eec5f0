//! Request lifecycle: creation, tutor response, and the timing sweep that
//! sends reminders and expires unanswered requests.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::WorkflowEngine;
use crate::calendar::replace_session_events;
use crate::domain::{
    PromptDelivery, RequestStatus, Session, SessionFeedback, SessionStatus, TutoringRequest,
};
use crate::events::WorkflowEvent;

/// What a parent submits to ask for a session.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewRequest {
    pub parent_id: String,
    pub child_id: String,
    pub tutor_id: String,
    pub subject: String,
    pub preferred_start_at: DateTime<Utc>,
    pub preferred_end_at: DateTime<Utc>,
}

impl WorkflowEngine {
    /// Records a new pending request. There is no uniqueness check; the same
    /// parent may ask the same tutor for the same slot twice.
    pub fn create_request(&mut self, new: NewRequest) -> TutoringRequest {
        let now = self.clock.now();
        let request = TutoringRequest::new(
            format!("req-{}", Uuid::new_v4()),
            new.parent_id,
            new.child_id,
            new.tutor_id,
            new.subject,
            new.preferred_start_at,
            new.preferred_end_at,
            now,
        );
        info!(request_id = %request.id, tutor_id = %request.tutor_id, "tutoring request created");

        self.outbox.push(WorkflowEvent::RequestCreated {
            request_id: request.id.clone(),
            tutor_id: request.tutor_id.clone(),
            response_due_at: request.response_due_at,
        });
        self.requests.push(request.clone());
        self.recompute_actions(now);
        request
    }

    /// Accepts a pending request and opens its session, awaiting parent approval.
    /// `start_at`/`end_at` override the preferred window individually.
    pub fn accept_request(
        &mut self,
        request_id: &str,
        start_at: Option<DateTime<Utc>>,
        end_at: Option<DateTime<Utc>>,
    ) {
        let now = self.clock.now();
        let Some(request) = self
            .requests
            .iter_mut()
            .find(|r| r.id == request_id && r.is_pending())
        else {
            debug!(request_id, "accept ignored: request unknown or no longer pending");
            return;
        };

        request.status = RequestStatus::Accepted;
        request.responded_at = Some(now);

        let session = Session {
            id: Session::id_for_request(&request.id),
            request_id: request.id.clone(),
            parent_id: request.parent_id.clone(),
            child_id: request.child_id.clone(),
            tutor_id: request.tutor_id.clone(),
            subject: request.subject.clone(),
            start_at: start_at.unwrap_or(request.preferred_start_at),
            end_at: end_at.unwrap_or(request.preferred_end_at),
            status: SessionStatus::AwaitingParentApproval,
            created_at: now,
            parent_approved_at: None,
            tutor_note: None,
            tutor_note_submitted_at: None,
            feedback_prompts: PromptDelivery::default(),
            feedback: SessionFeedback::default(),
            completed_at: None,
            cancelled_at: None,
        };
        info!(request_id, session_id = %session.id, "request accepted, session opened");

        self.outbox.push(WorkflowEvent::RequestAccepted {
            request_id: request.id.clone(),
            session_id: session.id.clone(),
            parent_id: request.parent_id.clone(),
        });
        replace_session_events(&mut self.calendar_events, &session);
        self.sessions.push(session);
        self.recompute_actions(now);
    }

    /// Declines a pending request and attaches fallback tutor suggestions.
    pub fn decline_request(&mut self, request_id: &str, reason: Option<String>) {
        let now = self.clock.now();
        let Some(request) = self
            .requests
            .iter_mut()
            .find(|r| r.id == request_id && r.is_pending())
        else {
            debug!(request_id, "decline ignored: request unknown or no longer pending");
            return;
        };

        let fallbacks = self.catalog.rank_fallbacks(&request.subject, &request.tutor_id);
        request.status = RequestStatus::Declined;
        request.responded_at = Some(now);
        request.decline_reason = reason;
        request.fallback_tutor_ids = fallbacks.clone();
        info!(request_id, fallbacks = fallbacks.len(), "request declined");

        self.outbox.push(WorkflowEvent::RequestDeclined {
            request_id: request.id.clone(),
            parent_id: request.parent_id.clone(),
            fallback_tutor_ids: fallbacks.clone(),
        });
        self.fallbacks.insert(request.id.clone(), fallbacks);
        self.recompute_actions(now);
    }

    /// Stamps due reminders and expires overdue requests.
    ///
    /// Safe to call repeatedly: reminders are stamped once and only pending
    /// requests are touched. Actions are recomputed once, after the pass.
    pub fn run_request_timing_sweep(&mut self, now: Option<DateTime<Utc>>) {
        let now = self.at_or_now(now);
        let mut reminded = 0usize;
        let mut expired = 0usize;

        for request in self.requests.iter_mut().filter(|r| r.is_pending()) {
            let stamp_reminder = now >= request.reminder_at && request.reminder_sent_at.is_none();
            if stamp_reminder {
                request.reminder_sent_at = Some(now);
            }

            if now >= request.response_due_at {
                let fallbacks = self.catalog.rank_fallbacks(&request.subject, &request.tutor_id);
                request.status = RequestStatus::Expired;
                request.responded_at = Some(now);
                request.fallback_tutor_ids = fallbacks.clone();
                self.fallbacks.insert(request.id.clone(), fallbacks.clone());
                self.outbox.push(WorkflowEvent::RequestExpired {
                    request_id: request.id.clone(),
                    parent_id: request.parent_id.clone(),
                    fallback_tutor_ids: fallbacks,
                });
                expired += 1;
            } else if stamp_reminder {
                self.outbox.push(WorkflowEvent::ReminderDue {
                    request_id: request.id.clone(),
                    tutor_id: request.tutor_id.clone(),
                    response_due_at: request.response_due_at,
                });
                reminded += 1;
            }
        }

        if reminded > 0 || expired > 0 {
            info!(reminded, expired, "request timing sweep applied");
        }
        self.recompute_actions(now);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use chrono::Duration;

    #[test]
    fn created_request_is_pending_with_fixed_deadlines() {
        let (mut engine, _clock) = engine();
        let req = engine.create_request(math_request());
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.created_at, t0());
        assert_eq!(req.response_due_at, t0() + Duration::hours(24));
        assert_eq!(req.reminder_at, t0() + Duration::hours(22));
        assert!(req.id.starts_with("req-"));
    }

    #[test]
    fn duplicate_requests_are_allowed() {
        let (mut engine, _clock) = engine();
        let a = engine.create_request(math_request());
        let b = engine.create_request(math_request());
        assert_ne!(a.id, b.id);
        assert_eq!(engine.requests().len(), 2);
    }

    #[test]
    fn accept_uses_override_times_independently() {
        let (mut engine, clock) = engine();
        let req = engine.create_request(math_request());
        clock.advance(Duration::hours(1));

        let new_end = t0() + Duration::days(2) + Duration::hours(2);
        engine.accept_request(&req.id, None, Some(new_end));

        let request = engine.request(&req.id).unwrap();
        assert_eq!(request.status, RequestStatus::Accepted);
        assert_eq!(request.responded_at, Some(t0() + Duration::hours(1)));

        let session = engine.session(&Session::id_for_request(&req.id)).unwrap();
        assert_eq!(session.status, SessionStatus::AwaitingParentApproval);
        assert_eq!(session.start_at, req.preferred_start_at);
        assert_eq!(session.end_at, new_end);
        assert_eq!(engine.calendar_events().len(), 3);
    }

    #[test]
    fn decline_stores_reason_and_fallbacks() {
        let (mut engine, _clock) = engine();
        let req = engine.create_request(math_request());
        engine.decline_request(&req.id, Some("Fully booked".into()));

        let request = engine.request(&req.id).unwrap();
        assert_eq!(request.status, RequestStatus::Declined);
        assert_eq!(request.decline_reason.as_deref(), Some("Fully booked"));
        assert_eq!(request.fallback_tutor_ids, vec!["tutor-2", "tutor-4", "tutor-5"]);
        assert_eq!(
            engine.fallback_tutors(&req.id),
            Some(request.fallback_tutor_ids.as_slice())
        );
    }

    #[test]
    fn late_responses_are_ignored() {
        let (mut engine, _clock) = engine();
        let req = engine.create_request(math_request());
        engine.decline_request(&req.id, None);
        engine.drain_events();
        let before = engine.snapshot();

        engine.accept_request(&req.id, None, None);
        engine.decline_request(&req.id, Some("again".into()));
        engine.accept_request("req-unknown", None, None);

        assert_eq!(engine.snapshot(), before);
        assert!(engine.drain_events().is_empty());
        assert!(engine.sessions().is_empty());
    }

    #[test]
    fn sweep_before_reminder_changes_nothing() {
        let (mut engine, _clock) = engine();
        let req = engine.create_request(math_request());
        engine.drain_events();
        engine.run_request_timing_sweep(Some(t0() + Duration::hours(21)));

        let request = engine.request(&req.id).unwrap();
        assert!(request.reminder_sent_at.is_none());
        assert!(request.is_pending());
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn reminder_is_stamped_once() {
        let (mut engine, _clock) = engine();
        let req = engine.create_request(math_request());
        engine.drain_events();

        let first = t0() + Duration::hours(22);
        engine.run_request_timing_sweep(Some(first));
        engine.run_request_timing_sweep(Some(first + Duration::minutes(30)));

        let request = engine.request(&req.id).unwrap();
        assert_eq!(request.reminder_sent_at, Some(first));
        let events = engine.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), "reminder_due");
    }

    #[test]
    fn overdue_request_expires_with_fallbacks() {
        let (mut engine, _clock) = engine();
        let req = engine.create_request(math_request());
        engine.drain_events();
        let late = t0() + Duration::hours(30);
        engine.run_request_timing_sweep(Some(late));

        let request = engine.request(&req.id).unwrap();
        assert_eq!(request.status, RequestStatus::Expired);
        assert_eq!(request.responded_at, Some(late));
        assert_eq!(request.reminder_sent_at, Some(late));
        assert_eq!(request.fallback_tutor_ids, vec!["tutor-2", "tutor-4", "tutor-5"]);

        let kinds: Vec<&str> = engine.drain_events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["request_expired"]);

        engine.run_request_timing_sweep(Some(late + Duration::hours(5)));
        assert_eq!(engine.request(&req.id).unwrap().responded_at, Some(late));
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn sweep_defaults_to_the_engine_clock() {
        let (mut engine, clock) = engine();
        let req = engine.create_request(math_request());
        clock.advance(Duration::hours(24));
        engine.run_request_timing_sweep(None);
        assert_eq!(engine.request(&req.id).unwrap().status, RequestStatus::Expired);
    }
}
