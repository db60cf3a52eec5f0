//! crates/tutoring_core/src/digest.rs
//!
//! Weekly digest aggregation. Reads requests, sessions and exercises and
//! produces one summary per actor per role for the window
//! `[week_start_at, week_start_at + 7 days)`.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

use crate::domain::{
    ExerciseTask, RequestStatus, Role, Session, SessionStatus, TutoringRequest, WeeklyDigest,
};

pub const DIGEST_WINDOW_DAYS: i64 = 7;

const CHILD_ENCOURAGEMENT: &str = "Keep it up! Try one extra exercise before next week.";
const PARENT_ALL_CLEAR: &str = "Nothing waiting on you. Book the next session whenever you're ready.";
const TUTOR_ALL_CLEAR: &str = "No pending requests. Thanks for staying on top of things!";

pub fn generate_digests(
    requests: &[TutoringRequest],
    sessions: &[Session],
    exercises: &[ExerciseTask],
    week_start_at: DateTime<Utc>,
    generated_at: DateTime<Utc>,
) -> Vec<WeeklyDigest> {
    let week_end_at = week_start_at + Duration::days(DIGEST_WINDOW_DAYS);
    let in_window = |at: Option<DateTime<Utc>>| {
        at.is_some_and(|at| at >= week_start_at && at < week_end_at)
    };
    let digest = |role: Role, target_id: &str, completed_count: usize, summary: String, action_items: Vec<String>| {
        WeeklyDigest {
            id: WeeklyDigest::id_for(role, target_id, week_start_at),
            role,
            target_id: target_id.to_string(),
            week_start_at,
            week_end_at,
            generated_at,
            completed_count: completed_count as u32,
            summary,
            action_items,
        }
    };

    let mut digests = Vec::new();

    let parents: BTreeSet<&str> = requests
        .iter()
        .map(|r| r.parent_id.as_str())
        .chain(sessions.iter().map(|s| s.parent_id.as_str()))
        .collect();
    for parent_id in parents {
        let completed = sessions
            .iter()
            .filter(|s| s.parent_id == parent_id && in_window(s.completed_at))
            .count();
        let pending = sessions
            .iter()
            .filter(|s| {
                s.parent_id == parent_id && s.status == SessionStatus::AwaitingParentApproval
            })
            .count();
        let action_items = if pending > 0 {
            vec![format!(
                "{} waiting for your approval.",
                plural(pending, "session", "sessions")
            )]
        } else {
            vec![PARENT_ALL_CLEAR.to_string()]
        };
        digests.push(digest(
            Role::Parent,
            parent_id,
            completed,
            format!("{} completed this week.", plural(completed, "session", "sessions")),
            action_items,
        ));
    }

    let children: BTreeSet<&str> = requests
        .iter()
        .map(|r| r.child_id.as_str())
        .chain(sessions.iter().map(|s| s.child_id.as_str()))
        .chain(exercises.iter().map(|e| e.child_id.as_str()))
        .collect();
    for child_id in children {
        let completed = exercises
            .iter()
            .filter(|e| e.child_id == child_id && in_window(e.completed_at))
            .count();
        digests.push(digest(
            Role::Child,
            child_id,
            completed,
            format!("{} completed this week.", plural(completed, "exercise", "exercises")),
            vec![CHILD_ENCOURAGEMENT.to_string()],
        ));
    }

    let tutors: BTreeSet<&str> = requests
        .iter()
        .map(|r| r.tutor_id.as_str())
        .chain(sessions.iter().map(|s| s.tutor_id.as_str()))
        .collect();
    for tutor_id in tutors {
        let completed = sessions
            .iter()
            .filter(|s| s.tutor_id == tutor_id && in_window(s.completed_at))
            .count();
        let pending = requests
            .iter()
            .filter(|r| r.tutor_id == tutor_id && r.status == RequestStatus::Pending)
            .count();
        let action_items = if pending > 0 {
            vec![format!(
                "{} waiting for your response.",
                plural(pending, "request", "requests")
            )]
        } else {
            vec![TUTOR_ALL_CLEAR.to_string()]
        };
        digests.push(digest(
            Role::Tutor,
            tutor_id,
            completed,
            format!("{} taught this week.", plural(completed, "session", "sessions")),
            action_items,
        ));
    }

    digests
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PromptDelivery, SessionFeedback};
    use chrono::TimeZone;

    fn week() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
    }

    fn session(id: &str, status: SessionStatus, completed_at: Option<DateTime<Utc>>) -> Session {
        Session {
            id: id.into(),
            request_id: format!("seed-{id}"),
            parent_id: "parent-1".into(),
            child_id: "child-1".into(),
            tutor_id: "tutor-1".into(),
            subject: "Math".into(),
            start_at: week(),
            end_at: week() + Duration::hours(1),
            status,
            created_at: week(),
            parent_approved_at: None,
            tutor_note: None,
            tutor_note_submitted_at: None,
            feedback_prompts: PromptDelivery::default(),
            feedback: SessionFeedback::default(),
            completed_at,
            cancelled_at: None,
        }
    }

    #[test]
    fn counts_only_completions_inside_the_window() {
        let sessions = vec![
            session("in", SessionStatus::Completed, Some(week() + Duration::days(2))),
            session("edge", SessionStatus::Completed, Some(week() + Duration::days(7))),
            session("before", SessionStatus::Completed, Some(week() - Duration::seconds(1))),
            session("waiting", SessionStatus::AwaitingParentApproval, None),
        ];
        let digests = generate_digests(&[], &sessions, &[], week(), week());

        let parent = digests.iter().find(|d| d.role == Role::Parent).unwrap();
        assert_eq!(parent.completed_count, 1);
        assert_eq!(parent.summary, "1 session completed this week.");
        assert_eq!(parent.action_items, vec!["1 session waiting for your approval."]);
        assert_eq!(parent.week_end_at, week() + Duration::days(7));

        let tutor = digests.iter().find(|d| d.role == Role::Tutor).unwrap();
        assert_eq!(tutor.completed_count, 1);
        assert_eq!(tutor.action_items, vec![TUTOR_ALL_CLEAR]);
    }

    #[test]
    fn child_digest_counts_exercises_and_always_encourages() {
        let exercises = vec![
            ExerciseTask {
                id: "e1".into(),
                child_id: "child-2".into(),
                title: "Fractions".into(),
                due_at: week(),
                completed_at: Some(week() + Duration::hours(5)),
            },
            ExerciseTask {
                id: "e2".into(),
                child_id: "child-2".into(),
                title: "Decimals".into(),
                due_at: week(),
                completed_at: None,
            },
        ];
        let digests = generate_digests(&[], &[], &exercises, week(), week());
        assert_eq!(digests.len(), 1);
        assert_eq!(digests[0].role, Role::Child);
        assert_eq!(digests[0].completed_count, 1);
        assert_eq!(digests[0].summary, "1 exercise completed this week.");
        assert_eq!(digests[0].action_items, vec![CHILD_ENCOURAGEMENT]);
    }

    #[test]
    fn one_digest_per_actor_per_role() {
        let sessions = vec![
            session("a", SessionStatus::Scheduled, None),
            session("b", SessionStatus::Scheduled, None),
        ];
        let digests = generate_digests(&[], &sessions, &[], week(), week());
        let roles: Vec<Role> = digests.iter().map(|d| d.role).collect();
        assert_eq!(roles, vec![Role::Parent, Role::Child, Role::Tutor]);
        assert_eq!(digests[0].action_items, vec![PARENT_ALL_CLEAR]);
        assert_eq!(digests[0].summary, "0 sessions completed this week.");
    }
}
