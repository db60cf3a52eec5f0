//! services/api/src/adapters/notifier.rs
//!
//! A `NotificationService` that writes each notification to the log. Push and
//! email delivery are handled outside this service; this adapter is the
//! hand-off point they hook into.

use async_trait::async_trait;
use tracing::info;
use tutoring_core::events::WorkflowEvent;
use tutoring_core::ports::{NotificationService, PortResult};

/// Logs notifications instead of sending them.
#[derive(Clone, Default)]
pub struct LogNotificationAdapter;

impl LogNotificationAdapter {
    pub fn new() -> Self {
        Self
    }
}

/// Who a notification for `event` goes to.
pub fn recipients(event: &WorkflowEvent) -> Vec<&str> {
    match event {
        WorkflowEvent::RequestCreated { tutor_id, .. }
        | WorkflowEvent::ReminderDue { tutor_id, .. }
        | WorkflowEvent::SessionEnded { tutor_id, .. } => vec![tutor_id.as_str()],
        WorkflowEvent::RequestAccepted { parent_id, .. }
        | WorkflowEvent::RequestDeclined { parent_id, .. }
        | WorkflowEvent::RequestExpired { parent_id, .. } => vec![parent_id.as_str()],
        WorkflowEvent::SessionApproved {
            tutor_id, child_id, ..
        } => vec![tutor_id.as_str(), child_id.as_str()],
        WorkflowEvent::FeedbackPromptsDue {
            parent_id, child_id, ..
        } => vec![parent_id.as_str(), child_id.as_str()],
        WorkflowEvent::SessionCompleted { .. } | WorkflowEvent::SessionCancelled { .. } => {
            Vec::new()
        }
    }
}

#[async_trait]
impl NotificationService for LogNotificationAdapter {
    async fn notify(&self, event: &WorkflowEvent) -> PortResult<()> {
        info!(
            kind = event.kind(),
            subject = event.subject_id(),
            recipients = ?recipients(event),
            "Notification dispatched."
        );
        Ok(())
    }
}
