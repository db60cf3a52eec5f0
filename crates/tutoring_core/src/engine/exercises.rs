//! Exercise tasks. Ids are scoped to a child; both operations upsert.

use chrono::{DateTime, Utc};
use tracing::info;

use super::WorkflowEngine;
use crate::domain::ExerciseTask;

impl WorkflowEngine {
    fn exercise_mut(&mut self, child_id: &str, exercise_id: &str) -> Option<&mut ExerciseTask> {
        self.exercises
            .iter_mut()
            .find(|e| e.child_id == child_id && e.id == exercise_id)
    }

    /// Assigns homework, or updates the title and due date of an existing task.
    /// A completed task stays completed.
    pub fn assign_exercise(
        &mut self,
        child_id: &str,
        exercise_id: &str,
        title: &str,
        due_at: DateTime<Utc>,
    ) {
        let now = self.clock.now();
        match self.exercise_mut(child_id, exercise_id) {
            Some(task) => {
                task.title = title.to_string();
                task.due_at = due_at;
            }
            None => self.exercises.push(ExerciseTask {
                id: exercise_id.to_string(),
                child_id: child_id.to_string(),
                title: title.to_string(),
                due_at,
                completed_at: None,
            }),
        }
        info!(child_id, exercise_id, "exercise assigned");
        self.recompute_actions(now);
    }

    /// Marks a task done, creating it if it was never assigned. The first
    /// completion time is kept.
    pub fn complete_exercise(
        &mut self,
        child_id: &str,
        exercise_id: &str,
        title: Option<String>,
        completed_at: Option<DateTime<Utc>>,
    ) {
        let at = self.at_or_now(completed_at);
        match self.exercise_mut(child_id, exercise_id) {
            Some(task) => {
                if let Some(title) = title {
                    task.title = title;
                }
                task.completed_at.get_or_insert(at);
            }
            None => self.exercises.push(ExerciseTask {
                id: exercise_id.to_string(),
                title: title.unwrap_or_else(|| exercise_id.to_string()),
                child_id: child_id.to_string(),
                due_at: at,
                completed_at: Some(at),
            }),
        }
        info!(child_id, exercise_id, "exercise completed");
        self.recompute_actions(at);
    }
}
