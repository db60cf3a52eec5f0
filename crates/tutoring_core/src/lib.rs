//! Workflow core for the tutoring marketplace: request and session
//! lifecycles, calendar projection, next-best-actions and weekly digests.

pub mod actions;
pub mod calendar;
pub mod catalog;
pub mod digest;
pub mod domain;
pub mod engine;
pub mod events;
pub mod onboarding;
pub mod ports;

pub use catalog::TutorCatalog;
pub use domain::{
    ActionType, CalendarEvent, ExerciseTask, FeedbackRecord, NextBestAction, OnboardingState,
    PromptDelivery, PromptRole, RequestStatus, Role, Session, SessionFeedback, SessionStatus,
    TutorCatalogEntry, TutoringRequest, WeeklyDigest,
};
pub use engine::{NewRequest, SessionSeed, WorkflowEngine, WorkflowSnapshot};
pub use events::WorkflowEvent;
pub use ports::{Clock, ManualClock, NotificationService, PortError, PortResult, SystemClock};
