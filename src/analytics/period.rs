//! Time-period selection and sprint filtering.
//!
//! Ranges are computed in the user's local offset (`DateTime<FixedOffset>`);
//! the API layer turns a `tz_offset` minutes parameter into that offset.
//! Weeks start on Monday.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ProjectId, Sprint};

/// The selectable reporting periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimePeriod {
    Today,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
}

impl TimePeriod {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TimePeriod::Today => "Today",
            TimePeriod::ThisWeek => "This Week",
            TimePeriod::LastWeek => "Last Week",
            TimePeriod::ThisMonth => "This Month",
            TimePeriod::LastMonth => "Last Month",
            TimePeriod::ThisYear => "This Year",
        }
    }
}

fn local_midnight(offset: &FixedOffset, date: NaiveDate) -> DateTime<FixedOffset> {
    // FixedOffset has no gaps, the local result is always unambiguous
    offset
        .from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
        .unwrap()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap()
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

fn monday_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Inclusive `[start, end]` range for a period, relative to `now`.
/// `end` is the start of the following period minus one millisecond.
pub fn period_range(
    period: TimePeriod,
    now: DateTime<FixedOffset>,
) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let offset = now.offset();
    let today = now.date_naive();
    let one_ms = Duration::milliseconds(1);

    let (start_date, next_date) = match period {
        TimePeriod::Today => (today, today + Duration::days(1)),
        TimePeriod::ThisWeek => {
            let monday = monday_of_week(today);
            (monday, monday + Duration::days(7))
        }
        TimePeriod::LastWeek => {
            let monday = monday_of_week(today);
            (monday - Duration::days(7), monday)
        }
        TimePeriod::ThisMonth => (first_of_month(today), first_of_next_month(today)),
        TimePeriod::LastMonth => {
            let this_first = first_of_month(today);
            let prev_first = first_of_month(this_first - Duration::days(1));
            (prev_first, this_first)
        }
        TimePeriod::ThisYear => (
            NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap(),
        ),
    };

    let start = local_midnight(offset, start_date);
    let end = local_midnight(offset, next_date) - one_ms;
    (start, end)
}

/// Select the sprints completed within the period (boundaries included at
/// both ends), optionally narrowed to one project.
pub fn filter_sprints<'a>(
    sprints: &'a [Sprint],
    period: TimePeriod,
    project: Option<&ProjectId>,
    now: DateTime<FixedOffset>,
) -> Vec<&'a Sprint> {
    let (start, end) = period_range(period, now);
    let start_utc = start.with_timezone(&Utc);
    let end_utc = end.with_timezone(&Utc);

    sprints
        .iter()
        .filter(|s| s.completed_at >= start_utc && s.completed_at <= end_utc)
        .filter(|s| project.map_or(true, |p| &s.project_id == p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewSprint, TimerKind};

    fn offset_hours(h: i32) -> FixedOffset {
        FixedOffset::east_opt(h * 3600).unwrap()
    }

    // Monday 2026-03-02, 14:30 local, UTC+0
    fn now_utc() -> DateTime<FixedOffset> {
        offset_hours(0)
            .with_ymd_and_hms(2026, 3, 2, 14, 30, 0)
            .unwrap()
    }

    fn sprint_completed_at(completed: DateTime<Utc>, project: &str) -> Sprint {
        NewSprint {
            project_id: project.into(),
            duration_seconds: 600,
            started_at: completed - Duration::seconds(600),
            completed_at: completed,
            mode: TimerKind::Stopwatch,
            notes: None,
        }
        .into_sprint("user-1".into())
    }

    #[test]
    fn test_today_range() {
        let (start, end) = period_range(TimePeriod::Today, now_utc());
        assert_eq!(start.to_rfc3339(), "2026-03-02T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-02T23:59:59.999+00:00");
    }

    #[test]
    fn test_this_week_starts_monday() {
        // now is already a Monday
        let (start, end) = period_range(TimePeriod::ThisWeek, now_utc());
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());

        // From a Sunday, the week still anchors on the preceding Monday
        let sunday = offset_hours(0)
            .with_ymd_and_hms(2026, 3, 8, 10, 0, 0)
            .unwrap();
        let (start, _) = period_range(TimePeriod::ThisWeek, sunday);
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_last_week_range() {
        let (start, end) = period_range(TimePeriod::LastWeek, now_utc());
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2026, 2, 23).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(end.to_rfc3339(), "2026-03-01T23:59:59.999+00:00");
    }

    #[test]
    fn test_month_ranges() {
        let (start, end) = period_range(TimePeriod::ThisMonth, now_utc());
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());

        let (start, end) = period_range(TimePeriod::LastMonth, now_utc());
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }

    #[test]
    fn test_last_month_across_january() {
        let jan = offset_hours(0)
            .with_ymd_and_hms(2026, 1, 15, 9, 0, 0)
            .unwrap();
        let (start, end) = period_range(TimePeriod::LastMonth, jan);
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_this_year_range() {
        let (start, end) = period_range(TimePeriod::ThisYear, now_utc());
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn test_range_respects_offset() {
        let tokyo = offset_hours(9)
            .with_ymd_and_hms(2026, 3, 2, 1, 0, 0)
            .unwrap();
        let (start, _) = period_range(TimePeriod::Today, tokyo);
        // Local midnight in UTC+9 is 15:00 UTC the previous day
        assert_eq!(
            start.with_timezone(&Utc).to_rfc3339(),
            "2026-03-01T15:00:00+00:00"
        );
    }

    #[test]
    fn test_filter_includes_boundaries() {
        let (start, end) = period_range(TimePeriod::Today, now_utc());
        let at_start = sprint_completed_at(start.with_timezone(&Utc), "p1");
        let at_end = sprint_completed_at(end.with_timezone(&Utc), "p1");
        let before = sprint_completed_at(start.with_timezone(&Utc) - Duration::milliseconds(1), "p1");
        let after = sprint_completed_at(end.with_timezone(&Utc) + Duration::milliseconds(1), "p1");

        let sprints = vec![at_start, at_end, before, after];
        let filtered = filter_sprints(&sprints, TimePeriod::Today, None, now_utc());
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filter_by_project() {
        let completed = now_utc().with_timezone(&Utc);
        let sprints = vec![
            sprint_completed_at(completed, "p1"),
            sprint_completed_at(completed, "p2"),
            sprint_completed_at(completed, "p1"),
        ];

        let p1: ProjectId = "p1".into();
        let filtered = filter_sprints(&sprints, TimePeriod::Today, Some(&p1), now_utc());
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|s| s.project_id == p1));
    }

    #[test]
    fn test_period_serde_kebab_case() {
        let p: TimePeriod = serde_json::from_str("\"this-week\"").unwrap();
        assert_eq!(p, TimePeriod::ThisWeek);
        assert_eq!(serde_json::to_string(&TimePeriod::LastMonth).unwrap(), "\"last-month\"");
    }
}
