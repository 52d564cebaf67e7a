//! Timer-to-persistence bridge.
//!
//! A `TimerSession` pairs a timer with the selected project and notes
//! buffer. When a run finishes it packages the interval as a sprint
//! draft for the caller to submit, then clears the transient state.
//! Submission failure is the caller's to surface; the session has
//! already reset either way.

use chrono::{DateTime, Utc};

use super::{FinishedRun, Timer, TimerError, TimerMode, TimerState};
use crate::models::{NewSprint, ProjectId};

/// Output of a session tick: display/progress plus a sprint draft when a
/// countdown just auto-completed.
#[derive(Debug, Clone)]
pub struct SessionTick {
    pub display: String,
    pub progress: f64,
    pub draft: Option<NewSprint>,
}

/// A timer bound to a project selection and notes buffer.
#[derive(Debug, Clone)]
pub struct TimerSession {
    timer: Timer,
    project_id: Option<ProjectId>,
    notes: String,
}

impl TimerSession {
    pub fn new(mode: TimerMode) -> Self {
        Self {
            timer: Timer::new(mode),
            project_id: None,
            notes: String::new(),
        }
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    pub fn select_project(&mut self, project_id: Option<ProjectId>) {
        self.project_id = project_id;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Start or resume the underlying timer.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        self.timer.start(now)
    }

    /// Pause the underlying timer.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        self.timer.pause(now)
    }

    /// Tick the timer; if a countdown auto-completed this tick, the
    /// result carries a sprint draft and the session has reset.
    pub fn tick(&mut self, now: DateTime<Utc>) -> SessionTick {
        let tick = self.timer.tick(now);
        let draft = tick.completed.and_then(|run| self.finish(run));
        SessionTick {
            display: tick.display,
            progress: tick.progress,
            draft,
        }
    }

    /// Manually complete the run. Returns a draft when there is a
    /// project selected and a non-zero interval; either way the timer
    /// stops and the session resets.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<Option<NewSprint>, TimerError> {
        let run = self.timer.complete(now)?;
        Ok(self.finish(run))
    }

    /// Discard the in-progress run without persisting anything.
    pub fn reset(&mut self) {
        self.timer.reset();
        self.notes.clear();
    }

    pub fn state(&self) -> TimerState {
        self.timer.state()
    }

    fn finish(&mut self, run: FinishedRun) -> Option<NewSprint> {
        let draft = match (&self.project_id, run.duration_seconds) {
            (Some(project_id), duration) if duration > 0 => {
                let notes = self.notes.trim();
                Some(NewSprint {
                    project_id: project_id.clone(),
                    duration_seconds: duration,
                    started_at: run.started_at,
                    completed_at: run.completed_at,
                    mode: run.mode,
                    notes: if notes.is_empty() {
                        None
                    } else {
                        Some(notes.to_string())
                    },
                })
            }
            _ => None,
        };
        self.reset();
        draft
    }
}
