//! Sprint model: one completed timed work interval tied to a project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, ProjectId, SprintId, UserId};

/// Maximum length of sprint notes.
pub const MAX_NOTES_LEN: usize = 2000;

/// Which kind of timer produced a sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    Countdown,
    Stopwatch,
}

impl TimerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::Countdown => "countdown",
            TimerKind::Stopwatch => "stopwatch",
        }
    }
}

/// A persisted sprint record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    /// Unique identifier
    pub id: SprintId,

    /// Owning user
    pub user_id: UserId,

    /// Project this sprint was recorded against. May dangle after the
    /// project is deleted; readers fall back to a placeholder name.
    pub project_id: ProjectId,

    /// Length of the work interval in seconds, always > 0
    pub duration_seconds: u32,

    /// Wall-clock instant the timer was first started for this run
    pub started_at: DateTime<Utc>,

    /// Wall-clock instant the timer completed
    pub completed_at: DateTime<Utc>,

    /// Countdown or stopwatch
    pub mode: TimerKind,

    /// Optional free-text notes, at most 2000 chars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A sprint draft produced by the timer bridge, not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSprint {
    pub project_id: ProjectId,
    pub duration_seconds: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub mode: TimerKind,
    pub notes: Option<String>,
}

impl NewSprint {
    /// Validate the draft's invariants.
    pub fn validate(&self) -> Result<(), SprintError> {
        if self.duration_seconds == 0 {
            return Err(SprintError::ZeroDuration);
        }
        if self.completed_at < self.started_at {
            return Err(SprintError::CompletedBeforeStarted);
        }
        if let Some(notes) = &self.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(SprintError::NotesTooLong);
            }
        }
        Ok(())
    }

    /// Materialize the draft into a Sprint owned by `user_id`.
    pub fn into_sprint(self, user_id: UserId) -> Sprint {
        Sprint {
            id: EntityId::generate(),
            user_id,
            project_id: self.project_id,
            duration_seconds: self.duration_seconds,
            started_at: self.started_at,
            completed_at: self.completed_at,
            mode: self.mode,
            notes: self.notes,
        }
    }
}

/// Sprint validation errors.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SprintError {
    #[error("Sprint duration must be greater than zero")]
    ZeroDuration,

    #[error("Sprint completion time cannot precede its start time")]
    CompletedBeforeStarted,

    #[error("Sprint notes cannot exceed {MAX_NOTES_LEN} characters")]
    NotesTooLong,
}
