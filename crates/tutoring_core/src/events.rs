//! crates/tutoring_core/src/events.rs
//!
//! Workflow events recorded by the engine on every effective transition.
//! Hosts drain them and hand them to a `NotificationService`; no-ops never
//! produce an event, so repeated sweeps cannot duplicate notifications.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A parent asked a tutor for a session; the tutor should be told.
    RequestCreated {
        request_id: String,
        tutor_id: String,
        response_due_at: DateTime<Utc>,
    },

    /// The tutor has not answered and the reminder time has passed.
    ReminderDue {
        request_id: String,
        tutor_id: String,
        response_due_at: DateTime<Utc>,
    },

    RequestAccepted {
        request_id: String,
        session_id: String,
        parent_id: String,
    },

    RequestDeclined {
        request_id: String,
        parent_id: String,
        fallback_tutor_ids: Vec<String>,
    },

    /// The tutor let the response window lapse.
    RequestExpired {
        request_id: String,
        parent_id: String,
        fallback_tutor_ids: Vec<String>,
    },

    SessionApproved {
        session_id: String,
        tutor_id: String,
        child_id: String,
    },

    /// The session's end time passed; the tutor owes notes.
    SessionEnded {
        session_id: String,
        tutor_id: String,
    },

    /// Parent and child should be asked for feedback. Hosts confirm delivery
    /// through `WorkflowEngine::deliver_feedback_prompt`.
    FeedbackPromptsDue {
        session_id: String,
        parent_id: String,
        child_id: String,
    },

    SessionCompleted {
        session_id: String,
    },

    SessionCancelled {
        session_id: String,
    },
}

impl WorkflowEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowEvent::RequestCreated { .. } => "request_created",
            WorkflowEvent::ReminderDue { .. } => "reminder_due",
            WorkflowEvent::RequestAccepted { .. } => "request_accepted",
            WorkflowEvent::RequestDeclined { .. } => "request_declined",
            WorkflowEvent::RequestExpired { .. } => "request_expired",
            WorkflowEvent::SessionApproved { .. } => "session_approved",
            WorkflowEvent::SessionEnded { .. } => "session_ended",
            WorkflowEvent::FeedbackPromptsDue { .. } => "feedback_prompts_due",
            WorkflowEvent::SessionCompleted { .. } => "session_completed",
            WorkflowEvent::SessionCancelled { .. } => "session_cancelled",
        }
    }

    /// The id of the request or session the event is about.
    pub fn subject_id(&self) -> &str {
        match self {
            WorkflowEvent::RequestCreated { request_id, .. }
            | WorkflowEvent::ReminderDue { request_id, .. }
            | WorkflowEvent::RequestAccepted { request_id, .. }
            | WorkflowEvent::RequestDeclined { request_id, .. }
            | WorkflowEvent::RequestExpired { request_id, .. } => request_id,
            WorkflowEvent::SessionApproved { session_id, .. }
            | WorkflowEvent::SessionEnded { session_id, .. }
            | WorkflowEvent::FeedbackPromptsDue { session_id, .. }
            | WorkflowEvent::SessionCompleted { session_id }
            | WorkflowEvent::SessionCancelled { session_id } => session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_a_type_tag() {
        let event = WorkflowEvent::SessionCompleted {
            session_id: "session-req-1".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session_completed");
        assert_eq!(json["session_id"], "session-req-1");
        assert_eq!(event.subject_id(), "session-req-1");
    }
}
