//! crates/tutoring_core/src/actions.rs
//!
//! Next-best-action derivation. A pure function of the current requests,
//! sessions and exercises; the engine replaces its whole list with the result
//! after every mutation.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::domain::{
    ActionType, ExerciseTask, NextBestAction, Role, Session, SessionStatus, TutoringRequest,
};

/// Recomputes the full action list, highest priority first.
///
/// Actors are visited in ascending id order, so equal priorities come out
/// sorted by target id.
pub fn derive_actions(
    requests: &[TutoringRequest],
    sessions: &[Session],
    exercises: &[ExerciseTask],
    now: DateTime<Utc>,
) -> Vec<NextBestAction> {
    let mut actions = Vec::new();

    let parents: BTreeSet<&str> = sessions
        .iter()
        .map(|s| s.parent_id.as_str())
        .chain(requests.iter().map(|r| r.parent_id.as_str()))
        .collect();
    for parent_id in parents {
        if let Some(session) = sessions.iter().find(|s| {
            s.parent_id == parent_id && s.status == SessionStatus::AwaitingParentApproval
        }) {
            actions.push(action(
                Role::Parent,
                parent_id,
                ActionType::ApprovePendingSession,
                format!("Approve {} session", session.subject),
                format!(
                    "{} proposed {} for {}. Confirm so it lands on everyone's calendar.",
                    session.tutor_id,
                    session.start_at.format("%a %d %b %H:%M"),
                    session.child_id
                ),
                &session.id,
                now,
            ));
        }
    }

    let children: BTreeSet<&str> = exercises
        .iter()
        .map(|e| e.child_id.as_str())
        .chain(sessions.iter().map(|s| s.child_id.as_str()))
        .collect();
    for child_id in children {
        let next = exercises
            .iter()
            .filter(|e| e.child_id == child_id && !e.is_complete())
            .min_by_key(|e| e.due_at);
        if let Some(exercise) = next {
            actions.push(action(
                Role::Child,
                child_id,
                ActionType::CompleteTodayExercise,
                format!("Finish \"{}\"", exercise.title),
                format!("Due {}.", exercise.due_at.format("%a %d %b %H:%M")),
                &exercise.id,
                now,
            ));
        }
    }

    let tutors: BTreeSet<&str> = sessions
        .iter()
        .map(|s| s.tutor_id.as_str())
        .chain(requests.iter().map(|r| r.tutor_id.as_str()))
        .collect();
    for tutor_id in tutors {
        if let Some(session) = sessions
            .iter()
            .find(|s| s.tutor_id == tutor_id && s.status == SessionStatus::AwaitingNotes)
        {
            actions.push(action(
                Role::Tutor,
                tutor_id,
                ActionType::SubmitSessionNotes,
                format!("Write notes for {} with {}", session.subject, session.child_id),
                "The family is waiting on your session notes.".to_string(),
                &session.id,
                now,
            ));
        }
    }

    actions.sort_by(|a, b| b.priority.cmp(&a.priority));
    actions
}

fn action(
    role: Role,
    target_id: &str,
    action_type: ActionType,
    title: String,
    description: String,
    related_id: &str,
    now: DateTime<Utc>,
) -> NextBestAction {
    NextBestAction {
        id: format!("nba-{}-{}-{}", role, target_id, action_type.as_str()),
        role,
        target_id: target_id.to_string(),
        action_type,
        title,
        description,
        priority: action_type.priority(),
        related_id: related_id.to_string(),
        created_at: now,
    }
}
