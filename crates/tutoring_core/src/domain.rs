//! crates/tutoring_core/src/domain.rs
//!
//! Defines the pure, core data structures of the tutoring workflow.
//! These structs are independent of any storage or transport; the engine is
//! the only code allowed to mutate them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How long a tutor has to answer a request.
pub const RESPONSE_WINDOW_HOURS: i64 = 24;
/// How long before the response deadline the tutor gets a reminder.
pub const REMINDER_LEAD_HOURS: i64 = 2;

//=========================================================================================
// Roles
//=========================================================================================

/// The three actor roles of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parent,
    Child,
    Tutor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Parent, Role::Child, Role::Tutor];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Child => "child",
            Role::Tutor => "tutor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The roles that receive a post-session feedback prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PromptRole {
    Parent,
    Child,
}

impl From<PromptRole> for Role {
    fn from(role: PromptRole) -> Self {
        match role {
            PromptRole::Parent => Role::Parent,
            PromptRole::Child => Role::Child,
        }
    }
}

//=========================================================================================
// Tutoring Requests
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// A parent's request for a tutor to teach their child a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TutoringRequest {
    pub id: String,
    pub parent_id: String,
    pub child_id: String,
    pub tutor_id: String,
    pub subject: String,
    pub preferred_start_at: DateTime<Utc>,
    pub preferred_end_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub response_due_at: DateTime<Utc>,
    pub reminder_at: DateTime<Utc>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    /// Ranked alternative tutors, filled on decline or expiry.
    pub fallback_tutor_ids: Vec<String>,
}

impl TutoringRequest {
    /// Builds a pending request. The deadline and reminder are fixed here and
    /// never recomputed.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        parent_id: String,
        child_id: String,
        tutor_id: String,
        subject: String,
        preferred_start_at: DateTime<Utc>,
        preferred_end_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let response_due_at = created_at + Duration::hours(RESPONSE_WINDOW_HOURS);
        let reminder_at = response_due_at - Duration::hours(REMINDER_LEAD_HOURS);
        Self {
            id,
            parent_id,
            child_id,
            tutor_id,
            subject,
            preferred_start_at,
            preferred_end_at,
            status: RequestStatus::Pending,
            created_at,
            response_due_at,
            reminder_at,
            reminder_sent_at: None,
            responded_at: None,
            decline_reason: None,
            fallback_tutor_ids: Vec::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

//=========================================================================================
// Sessions
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    AwaitingParentApproval,
    Scheduled,
    AwaitingNotes,
    AwaitingFeedbackPrompts,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

/// Which feedback prompts have been delivered, and when.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PromptDelivery {
    pub parent_delivered_at: Option<DateTime<Utc>>,
    pub child_delivered_at: Option<DateTime<Utc>>,
}

impl PromptDelivery {
    pub fn is_delivered(&self, role: PromptRole) -> bool {
        match role {
            PromptRole::Parent => self.parent_delivered_at.is_some(),
            PromptRole::Child => self.child_delivered_at.is_some(),
        }
    }

    pub fn all_delivered(&self) -> bool {
        self.parent_delivered_at.is_some() && self.child_delivered_at.is_some()
    }

    /// Marks the prompt as delivered, keeping the first delivery time.
    pub fn mark(&mut self, role: PromptRole, at: DateTime<Utc>) {
        let slot = match role {
            PromptRole::Parent => &mut self.parent_delivered_at,
            PromptRole::Child => &mut self.child_delivered_at,
        };
        slot.get_or_insert(at);
    }
}

/// Feedback left by one participant after a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FeedbackRecord {
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// One optional feedback slot per role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionFeedback {
    pub parent: Option<FeedbackRecord>,
    pub child: Option<FeedbackRecord>,
    pub tutor: Option<FeedbackRecord>,
}

impl SessionFeedback {
    pub fn get(&self, role: Role) -> Option<&FeedbackRecord> {
        match role {
            Role::Parent => self.parent.as_ref(),
            Role::Child => self.child.as_ref(),
            Role::Tutor => self.tutor.as_ref(),
        }
    }

    pub fn set(&mut self, role: Role, record: FeedbackRecord) {
        match role {
            Role::Parent => self.parent = Some(record),
            Role::Child => self.child = Some(record),
            Role::Tutor => self.tutor = Some(record),
        }
    }
}

/// A tutoring session, created 1:1 from an accepted request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Session {
    pub id: String,
    /// Originating request; synthetic for seeded sessions.
    pub request_id: String,
    pub parent_id: String,
    pub child_id: String,
    pub tutor_id: String,
    pub subject: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub parent_approved_at: Option<DateTime<Utc>>,
    pub tutor_note: Option<String>,
    pub tutor_note_submitted_at: Option<DateTime<Utc>>,
    pub feedback_prompts: PromptDelivery,
    pub feedback: SessionFeedback,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Session {
    /// The id a session gets when created from a request.
    pub fn id_for_request(request_id: &str) -> String {
        format!("session-{request_id}")
    }

    /// True when the note is in and both prompts went out.
    pub fn completion_ready(&self) -> bool {
        self.tutor_note_submitted_at.is_some() && self.feedback_prompts.all_delivered()
    }

    pub fn participant(&self, role: Role) -> &str {
        match role {
            Role::Parent => &self.parent_id,
            Role::Child => &self.child_id,
            Role::Tutor => &self.tutor_id,
        }
    }
}

//=========================================================================================
// Calendar, Exercises, Actions, Digests
//=========================================================================================

/// A role-scoped calendar entry projected from a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CalendarEvent {
    pub id: String,
    pub session_id: String,
    pub role: Role,
    pub owner_id: String,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Homework assigned to a child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExerciseTask {
    pub id: String,
    pub child_id: String,
    pub title: String,
    pub due_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ExerciseTask {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ApprovePendingSession,
    CompleteTodayExercise,
    SubmitSessionNotes,
}

impl ActionType {
    pub fn priority(self) -> u32 {
        match self {
            ActionType::ApprovePendingSession => 100,
            ActionType::SubmitSessionNotes => 95,
            ActionType::CompleteTodayExercise => 90,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::ApprovePendingSession => "approve_pending_session",
            ActionType::CompleteTodayExercise => "complete_today_exercise",
            ActionType::SubmitSessionNotes => "submit_session_notes",
        }
    }
}

/// A derived recommendation for one actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NextBestAction {
    pub id: String,
    pub role: Role,
    pub target_id: String,
    pub action_type: ActionType,
    pub title: String,
    pub description: String,
    pub priority: u32,
    /// The session or exercise the action points at.
    pub related_id: String,
    pub created_at: DateTime<Utc>,
}

/// A per-actor summary of one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WeeklyDigest {
    pub id: String,
    pub role: Role,
    pub target_id: String,
    pub week_start_at: DateTime<Utc>,
    pub week_end_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    /// Sessions (parent, tutor) or exercises (child) completed in the window.
    pub completed_count: u32,
    pub summary: String,
    pub action_items: Vec<String>,
}

impl WeeklyDigest {
    pub fn id_for(role: Role, target_id: &str, week_start_at: DateTime<Utc>) -> String {
        format!(
            "digest-{}-{}-{}",
            role,
            target_id,
            week_start_at.timestamp_millis()
        )
    }
}

//=========================================================================================
// Catalog and Onboarding
//=========================================================================================

/// Static reference data about a tutor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TutorCatalogEntry {
    pub tutor_id: String,
    pub subjects: Vec<String>,
    pub rating: f64,
}

impl TutorCatalogEntry {
    pub fn teaches(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }
}

/// Onboarding progress of one user in one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OnboardingState {
    pub user_id: String,
    pub role: Role,
    /// Steps in the order they were first recorded.
    pub completed_steps: Vec<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl OnboardingState {
    pub fn new(user_id: &str, role: Role) -> Self {
        Self {
            user_id: user_id.to_string(),
            role,
            completed_steps: Vec::new(),
            completed_at: None,
            updated_at: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
    }

    #[test]
    fn request_deadlines_are_derived_from_creation() {
        let req = TutoringRequest::new(
            "req-1".into(),
            "parent-1".into(),
            "child-1".into(),
            "tutor-1".into(),
            "Math".into(),
            t0() + Duration::days(2),
            t0() + Duration::days(2) + Duration::hours(1),
            t0(),
        );
        assert_eq!(req.response_due_at, t0() + Duration::hours(24));
        assert_eq!(req.reminder_at, req.response_due_at - Duration::hours(2));
        assert!(req.is_pending());
        assert!(req.fallback_tutor_ids.is_empty());
    }

    #[test]
    fn prompt_delivery_keeps_first_timestamp() {
        let mut prompts = PromptDelivery::default();
        prompts.mark(PromptRole::Child, t0());
        prompts.mark(PromptRole::Child, t0() + Duration::hours(1));
        assert_eq!(prompts.child_delivered_at, Some(t0()));
        assert!(!prompts.all_delivered());
        prompts.mark(PromptRole::Parent, t0());
        assert!(prompts.all_delivered());
    }

    #[test]
    fn digest_id_is_stable_for_the_same_week() {
        let a = WeeklyDigest::id_for(Role::Tutor, "tutor-1", t0());
        let b = WeeklyDigest::id_for(Role::Tutor, "tutor-1", t0());
        assert_eq!(a, b);
        assert_ne!(a, WeeklyDigest::id_for(Role::Parent, "tutor-1", t0()));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Expired.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
        assert!(!SessionStatus::AwaitingNotes.is_terminal());
    }
}
