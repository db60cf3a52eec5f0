//! crates/tutoring_core/src/ports.rs
//!
//! Defines the service contracts at the edge of the workflow core.
//! The engine never reads the wall clock or talks to a delivery channel
//! directly; hosts plug concrete implementations into these ports.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

use crate::events::WorkflowEvent;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Clock
//=========================================================================================

/// Source of "now" for operations called without an explicit timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

//=========================================================================================
// Notification Delivery
//=========================================================================================

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Delivers the notification that belongs to a workflow event.
    /// Returning `Ok` means the recipient has been reached.
    async fn notify(&self, event: &WorkflowEvent) -> PortResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_moves_only_on_demand() {
        let start = Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), start + Duration::minutes(90));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    struct Rejecting;

    #[async_trait]
    impl NotificationService for Rejecting {
        async fn notify(&self, event: &WorkflowEvent) -> PortResult<()> {
            Err(PortError::Unexpected(format!("channel down for {}", event.kind())))
        }
    }

    #[tokio::test]
    async fn notification_errors_carry_the_event_kind() {
        let event = WorkflowEvent::ReminderDue {
            request_id: "req-1".into(),
            tutor_id: "tutor-1".into(),
            response_due_at: Utc.with_ymd_and_hms(2025, 1, 7, 8, 0, 0).unwrap(),
        };
        let err = Rejecting.notify(&event).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "An unexpected error occurred: channel down for reminder_due"
        );
    }
}
