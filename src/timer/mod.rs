//! Timer state machine, target parsing, and the sprint bridge.
//!
//! The machine is pure: every transition takes an explicit `now` so tests
//! never sleep and drivers (TTY loop, UI layer) own the tick cadence.

mod bridge;
mod machine;

pub use bridge::{SessionTick, TimerSession};
pub use machine::{FinishedRun, Tick, Timer, TimerError, TimerState};

use regex::Regex;

use crate::models::TimerKind;

/// Timer modes: a free-running stopwatch, fixed countdown presets, and a
/// custom countdown with a user-entered target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Stopwatch,
    FifteenMin,
    ThirtyMin,
    OneHour,
    TwoHours,
    Custom,
}

impl TimerMode {
    /// Target seconds for the fixed presets. Stopwatch and custom have
    /// none here; custom carries its target on the timer itself.
    pub fn preset_seconds(&self) -> Option<u32> {
        match self {
            TimerMode::FifteenMin => Some(15 * 60),
            TimerMode::ThirtyMin => Some(30 * 60),
            TimerMode::OneHour => Some(60 * 60),
            TimerMode::TwoHours => Some(120 * 60),
            TimerMode::Stopwatch | TimerMode::Custom => None,
        }
    }

    /// Countdown/stopwatch classification for persisted sprints.
    pub fn kind(&self) -> TimerKind {
        match self {
            TimerMode::Stopwatch => TimerKind::Stopwatch,
            _ => TimerKind::Countdown,
        }
    }
}

/// Parse a free-text countdown target like "1h 30m", "45m", "2h", or a
/// bare number of minutes. Returns seconds; `None` when nothing usable
/// (or zero) was entered.
pub fn parse_target(input: &str) -> Option<u32> {
    let cleaned = input.trim().to_lowercase();
    if cleaned.is_empty() {
        return None;
    }

    let hour_re = Regex::new(r"(\d+)\s*h(?:ours?)?").unwrap();
    let minute_re = Regex::new(r"(\d+)\s*m(?:in(?:utes?)?)?").unwrap();

    let mut minutes: u32 = 0;
    let hours = hour_re
        .captures(&cleaned)
        .and_then(|c| c[1].parse::<u32>().ok());
    let mins = minute_re
        .captures(&cleaned)
        .and_then(|c| c[1].parse::<u32>().ok());

    if let Some(h) = hours {
        minutes += h.saturating_mul(60);
    }
    if let Some(m) = mins {
        minutes += m;
    }

    // Bare number falls back to minutes
    if hours.is_none() && mins.is_none() {
        let number_re = Regex::new(r"(\d+)").unwrap();
        minutes = number_re
            .captures(&cleaned)
            .and_then(|c| c[1].parse::<u32>().ok())?;
    }

    let seconds = minutes.saturating_mul(60);
    if seconds == 0 {
        None
    } else {
        Some(seconds)
    }
}

/// Render seconds as a zero-padded `HH:MM:SS` clock string.
pub fn format_clock(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_seconds() {
        assert_eq!(TimerMode::FifteenMin.preset_seconds(), Some(900));
        assert_eq!(TimerMode::ThirtyMin.preset_seconds(), Some(1800));
        assert_eq!(TimerMode::OneHour.preset_seconds(), Some(3600));
        assert_eq!(TimerMode::TwoHours.preset_seconds(), Some(7200));
        assert_eq!(TimerMode::Stopwatch.preset_seconds(), None);
        assert_eq!(TimerMode::Custom.preset_seconds(), None);
    }

    #[test]
    fn test_mode_kind() {
        assert_eq!(TimerMode::Stopwatch.kind(), TimerKind::Stopwatch);
        assert_eq!(TimerMode::FifteenMin.kind(), TimerKind::Countdown);
        assert_eq!(TimerMode::Custom.kind(), TimerKind::Countdown);
    }

    #[test]
    fn test_parse_target_hours_and_minutes() {
        assert_eq!(parse_target("1h 30m"), Some(5400));
        assert_eq!(parse_target("1h30m"), Some(5400));
        assert_eq!(parse_target("2 hours 5 minutes"), Some(7500));
    }

    #[test]
    fn test_parse_target_single_component() {
        assert_eq!(parse_target("2h"), Some(7200));
        assert_eq!(parse_target("45m"), Some(2700));
        assert_eq!(parse_target("45 min"), Some(2700));
    }

    #[test]
    fn test_parse_target_bare_number_is_minutes() {
        assert_eq!(parse_target("90"), Some(5400));
        assert_eq!(parse_target("25"), Some(1500));
    }

    #[test]
    fn test_parse_target_rejects_empty_and_zero() {
        assert_eq!(parse_target(""), None);
        assert_eq!(parse_target("   "), None);
        assert_eq!(parse_target("0"), None);
        assert_eq!(parse_target("0h 0m"), None);
        assert_eq!(parse_target("soon"), None);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(59), "00:00:59");
        assert_eq!(format_clock(61), "00:01:01");
        assert_eq!(format_clock(3600), "01:00:00");
        assert_eq!(format_clock(5400), "01:30:00");
        assert_eq!(format_clock(36_005), "10:00:05");
    }
}
