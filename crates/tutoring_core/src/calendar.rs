//! crates/tutoring_core/src/calendar.rs
//!
//! Calendar projection: every session shows up exactly once in each
//! participant's calendar. Entries are always rebuilt, never patched.

use crate::domain::{CalendarEvent, Role, Session};

/// The three role-scoped entries for a session.
pub fn project_session(session: &Session) -> [CalendarEvent; 3] {
    Role::ALL.map(|role| CalendarEvent {
        id: format!("{}-{}", session.id, role),
        session_id: session.id.clone(),
        role,
        owner_id: session.participant(role).to_string(),
        title: title_for(role, session),
        start_at: session.start_at,
        end_at: session.end_at,
    })
}

/// Drops every entry of the session, then appends a fresh projection.
pub fn replace_session_events(events: &mut Vec<CalendarEvent>, session: &Session) {
    events.retain(|e| e.session_id != session.id);
    events.extend(project_session(session));
}

fn title_for(role: Role, session: &Session) -> String {
    match role {
        Role::Parent => format!("{} tutoring for {}", session.subject, session.child_id),
        Role::Child => format!("{} class with {}", session.subject, session.tutor_id),
        Role::Tutor => format!("{} lesson with {}", session.subject, session.child_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PromptDelivery, SessionFeedback, SessionStatus};
    use chrono::{Duration, TimeZone, Utc};

    fn session() -> Session {
        let start = Utc.with_ymd_and_hms(2025, 4, 2, 16, 0, 0).unwrap();
        Session {
            id: "session-req-9".into(),
            request_id: "req-9".into(),
            parent_id: "parent-1".into(),
            child_id: "child-1".into(),
            tutor_id: "tutor-2".into(),
            subject: "Chemistry".into(),
            start_at: start,
            end_at: start + Duration::hours(1),
            status: SessionStatus::Scheduled,
            created_at: start - Duration::days(1),
            parent_approved_at: None,
            tutor_note: None,
            tutor_note_submitted_at: None,
            feedback_prompts: PromptDelivery::default(),
            feedback: SessionFeedback::default(),
            completed_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn one_entry_per_role_scoped_to_the_participant() {
        let events = project_session(&session());
        let owners: Vec<(Role, &str)> = events.iter().map(|e| (e.role, e.owner_id.as_str())).collect();
        assert_eq!(
            owners,
            vec![
                (Role::Parent, "parent-1"),
                (Role::Child, "child-1"),
                (Role::Tutor, "tutor-2")
            ]
        );
        assert_eq!(events[2].title, "Chemistry lesson with child-1");
    }

    #[test]
    fn replacing_purges_old_entries_of_the_same_session() {
        let mut s = session();
        let mut events = Vec::new();
        replace_session_events(&mut events, &s);

        s.start_at += Duration::days(1);
        s.end_at += Duration::days(1);
        replace_session_events(&mut events, &s);

        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.start_at == s.start_at && e.end_at == s.end_at));
    }

    #[test]
    fn other_sessions_are_untouched() {
        let a = session();
        let mut b = session();
        b.id = "session-req-10".into();

        let mut events = Vec::new();
        replace_session_events(&mut events, &a);
        replace_session_events(&mut events, &b);
        replace_session_events(&mut events, &a);

        assert_eq!(events.len(), 6);
        assert_eq!(events.iter().filter(|e| e.session_id == b.id).count(), 3);
    }
}
