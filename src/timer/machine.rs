//! The timer state machine.
//!
//! States: `idle -> running -> paused -> running -> completed`. Elapsed
//! time is always recomputed from wall-clock instants captured at
//! start/pause/resume, never from counted ticks, so a suspended process
//! or a slow tick source cannot skew the recorded duration.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

use super::{format_clock, TimerMode};
use crate::models::TimerKind;

/// Timer lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// Timer transition errors.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: TimerState,
    },

    #[error("Mode can only be changed while idle")]
    NotIdle,

    #[error("Countdown target must be greater than zero")]
    ZeroTarget,
}

/// A finished run, ready for the bridge to turn into a sprint draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedRun {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: u32,
    pub mode: TimerKind,
}

/// Output of a tick: the display string (the output port for tab titles
/// or TTY rendering), countdown progress, and the auto-completed run if
/// the target was just reached.
#[derive(Debug, Clone)]
pub struct Tick {
    pub display: String,
    pub progress: f64,
    pub completed: Option<FinishedRun>,
}

/// The timer itself. All transitions take an explicit `now`.
#[derive(Debug, Clone)]
pub struct Timer {
    state: TimerState,
    mode: TimerMode,
    custom_target: u32,
    started_at: Option<DateTime<Utc>>,
    resumed_at: Option<DateTime<Utc>>,
    paused_accumulated: Duration,
}

impl Timer {
    /// Create an idle timer in the given mode.
    pub fn new(mode: TimerMode) -> Self {
        Self {
            state: TimerState::Idle,
            mode,
            custom_target: 0,
            started_at: None,
            resumed_at: None,
            paused_accumulated: Duration::zero(),
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    /// Countdown target in seconds; `None` for stopwatch or an unarmed
    /// custom countdown.
    pub fn target_seconds(&self) -> Option<u32> {
        match self.mode {
            TimerMode::Custom => {
                if self.custom_target > 0 {
                    Some(self.custom_target)
                } else {
                    None
                }
            }
            _ => self.mode.preset_seconds(),
        }
    }

    /// Wall-clock instant of the first `start()` of the current run.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Seconds elapsed (excluding paused time) as of `now`.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u32 {
        let mut elapsed = self.paused_accumulated;
        if self.state == TimerState::Running {
            if let Some(resumed) = self.resumed_at {
                elapsed = elapsed + (now - resumed);
            }
        }
        elapsed.num_seconds().max(0) as u32
    }

    /// Countdown progress percentage, 0 for stopwatch.
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        match self.target_seconds() {
            Some(target) if target > 0 => {
                let pct = self.elapsed_seconds(now) as f64 / target as f64 * 100.0;
                pct.min(100.0)
            }
            _ => 0.0,
        }
    }

    /// Start from idle, or resume from paused.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        match self.state {
            TimerState::Idle => {
                if self.mode != TimerMode::Stopwatch && self.target_seconds().is_none() {
                    return Err(TimerError::ZeroTarget);
                }
                self.started_at = Some(now);
                self.resumed_at = Some(now);
                self.paused_accumulated = Duration::zero();
                self.state = TimerState::Running;
                Ok(())
            }
            TimerState::Paused => {
                // Re-anchor; accumulated paused time is preserved
                self.resumed_at = Some(now);
                self.state = TimerState::Running;
                Ok(())
            }
            state => Err(TimerError::InvalidTransition {
                action: "start",
                state,
            }),
        }
    }

    /// Freeze elapsed time. Valid only while running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), TimerError> {
        match self.state {
            TimerState::Running => {
                if let Some(resumed) = self.resumed_at.take() {
                    self.paused_accumulated = self.paused_accumulated + (now - resumed);
                }
                self.state = TimerState::Paused;
                Ok(())
            }
            state => Err(TimerError::InvalidTransition {
                action: "pause",
                state,
            }),
        }
    }

    /// Finish the run manually, from running or paused.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<FinishedRun, TimerError> {
        match self.state {
            TimerState::Running | TimerState::Paused => {
                let mut duration = self.elapsed_seconds(now);
                if let Some(target) = self.target_seconds() {
                    duration = duration.min(target);
                }
                let run = FinishedRun {
                    started_at: self.started_at.unwrap_or(now),
                    completed_at: now,
                    duration_seconds: duration,
                    mode: self.mode.kind(),
                };
                self.state = TimerState::Completed;
                Ok(run)
            }
            state => Err(TimerError::InvalidTransition {
                action: "complete",
                state,
            }),
        }
    }

    /// Recompute elapsed time. For a running countdown that has reached
    /// its target, this transitions to completed exactly once and returns
    /// the finished run in the tick result.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        let mut completed = None;

        if self.state == TimerState::Running {
            if let Some(target) = self.target_seconds() {
                if self.elapsed_seconds(now) >= target {
                    // Clamp to the target; the tick source may overshoot
                    completed = Some(FinishedRun {
                        started_at: self.started_at.unwrap_or(now),
                        completed_at: now,
                        duration_seconds: target,
                        mode: self.mode.kind(),
                    });
                    self.state = TimerState::Completed;
                }
            }
        }

        Tick {
            display: self.display(now),
            progress: self.progress(now),
            completed,
        }
    }

    /// Display string: countdown shows the target while idle and the
    /// remaining time while running/paused; stopwatch shows elapsed.
    pub fn display(&self, now: DateTime<Utc>) -> String {
        match self.target_seconds() {
            Some(target) if self.state == TimerState::Idle => format_clock(target),
            Some(target) if self.state != TimerState::Completed => {
                let remaining = target.saturating_sub(self.elapsed_seconds(now));
                format_clock(remaining)
            }
            _ => format_clock(self.elapsed_seconds(now)),
        }
    }

    /// Back to idle. Mode and custom target survive a reset.
    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.started_at = None;
        self.resumed_at = None;
        self.paused_accumulated = Duration::zero();
    }

    /// Switch modes. Rejected outside idle; the UI layer owns the
    /// confirm-and-reset flow for in-progress runs.
    pub fn set_mode(&mut self, mode: TimerMode) -> Result<(), TimerError> {
        if self.state != TimerState::Idle {
            return Err(TimerError::NotIdle);
        }
        self.mode = mode;
        self.started_at = None;
        self.resumed_at = None;
        self.paused_accumulated = Duration::zero();
        Ok(())
    }

    /// Arm the custom countdown target. Idle only, must be > 0.
    pub fn set_custom_target(&mut self, seconds: u32) -> Result<(), TimerError> {
        if self.state != TimerState::Idle {
            return Err(TimerError::NotIdle);
        }
        if seconds == 0 {
            return Err(TimerError::ZeroTarget);
        }
        self.custom_target = seconds;
        Ok(())
    }
}
