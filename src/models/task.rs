use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of work that pomodoro time is logged against. Progress is tracked
/// in seconds so completed and skipped intervals both count what they ran.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub target_seconds: u64,
    pub logged_seconds: u64,
    pub created_at: DateTime<Local>,
    pub completed_at: Option<DateTime<Local>>,
    pub is_completed: bool,
}

impl Task {
    pub fn create(name: impl Into<String>, target_seconds: u64, now: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            target_seconds,
            logged_seconds: 0,
            created_at: now,
            completed_at: None,
            is_completed: false,
        }
    }

    pub fn log_session(&mut self, duration_seconds: u64) {
        self.logged_seconds = self.logged_seconds.saturating_add(duration_seconds);
    }

    pub fn mark_completed(&mut self, now: DateTime<Local>) {
        self.is_completed = true;
        self.completed_at = Some(now);
    }

    /// Fraction of the target reached, clamped to 1.0. Zero-target tasks
    /// report no progress.
    pub fn progress(&self) -> f64 {
        if self.target_seconds == 0 {
            return 0.0;
        }
        (self.logged_seconds as f64 / self.target_seconds as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_accumulates_and_clamps() {
        let mut task = Task::create("write report", 3000, Local::now());
        assert_eq!(task.progress(), 0.0);

        task.log_session(1500);
        assert!((task.progress() - 0.5).abs() < f64::EPSILON);

        task.log_session(9000);
        assert_eq!(task.progress(), 1.0);
    }

    #[test]
    fn zero_target_reports_no_progress() {
        let mut task = Task::create("untracked", 0, Local::now());
        task.log_session(500);
        assert_eq!(task.progress(), 0.0);
    }

    #[test]
    fn mark_completed_stamps_time() {
        let mut task = Task::create("ship it", 1500, Local::now());
        let done_at = Local::now();
        task.mark_completed(done_at);
        assert!(task.is_completed);
        assert_eq!(task.completed_at, Some(done_at));
    }
}
