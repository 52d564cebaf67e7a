//! Chart bucketing and axis scaling.
//!
//! With no project selected the chart shows one bar per project. With a
//! project selected, sprints are grouped into sub-period buckets:
//! 3-hour blocks for today, weekdays for weeks, calendar days for
//! months, months for the year. Buckets whose window has not started yet
//! are flagged `future` and excluded from axis scaling.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Timelike};
use serde::Serialize;

use super::metrics::format_duration;
use super::period::TimePeriod;
use crate::models::{Project, ProjectId, Sprint};

const HOUR_BLOCK_LABELS: [&str; 8] = [
    "0-3am", "3-6am", "6-9am", "9am-12pm", "12-3pm", "3-6pm", "6-9pm", "9pm-12am",
];

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One chart bar.
#[derive(Debug, Clone, Serialize)]
pub struct Bucket {
    pub label: String,
    pub seconds: u64,
    /// Formatted value, empty for zero buckets
    pub display: String,
    /// The bucket's window has not started yet
    pub future: bool,
    /// Whether a per-bar value label should render
    pub show_value: bool,
}

/// Y-axis scale: a domain max, exactly five evenly spaced ticks, and the
/// unit the tick labels use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisScale {
    pub domain_max: u64,
    pub ticks: [u64; 5],
    pub use_minutes: bool,
}

/// Pick a "nice" axis scale for the given maximum bucket value.
pub fn calculate_y_axis_domain(max_seconds: u64) -> AxisScale {
    if max_seconds == 0 {
        return AxisScale {
            domain_max: 3600,
            ticks: [0, 900, 1800, 2700, 3600],
            use_minutes: true,
        };
    }

    let tier = if max_seconds <= 3600 {
        900
    } else if max_seconds <= 7200 {
        1800
    } else if max_seconds <= 14400 {
        3600
    } else {
        7200
    };

    let mut step = max_seconds.div_ceil(4 * tier) * tier;
    if step < 900 {
        step = 900;
    }

    let domain_max = step * 4;
    AxisScale {
        domain_max,
        ticks: [0, step, step * 2, step * 3, domain_max],
        use_minutes: domain_max <= 3600,
    }
}

/// Format an axis tick value in the scale's unit.
pub fn axis_label(value: u64, use_minutes: bool) -> String {
    if use_minutes {
        format!("{}m", (value + 30) / 60)
    } else {
        format!("{}h", (value + 1800) / 3600)
    }
}

/// Largest non-future bucket value, for axis scaling.
pub fn max_bucket_seconds(buckets: &[Bucket]) -> u64 {
    buckets
        .iter()
        .filter(|b| !b.future)
        .map(|b| b.seconds)
        .max()
        .unwrap_or(0)
}

/// Build chart buckets from an already period-filtered sprint set.
pub fn chart_buckets(
    sprints: &[&Sprint],
    period: TimePeriod,
    project_filter: Option<&ProjectId>,
    projects: &[Project],
    now: DateTime<FixedOffset>,
) -> Vec<Bucket> {
    match project_filter {
        None => project_buckets(sprints, period, projects),
        Some(_) => sub_period_buckets(sprints, period, now),
    }
}

/// One bar per existing project; sprints referencing deleted projects
/// contribute to no bar.
fn project_buckets(sprints: &[&Sprint], period: TimePeriod, projects: &[Project]) -> Vec<Bucket> {
    projects
        .iter()
        .map(|project| {
            let seconds: u64 = sprints
                .iter()
                .filter(|s| s.project_id == project.id)
                .map(|s| s.duration_seconds as u64)
                .sum();
            make_bucket(project.name.clone(), seconds, false, period)
        })
        .collect()
}

fn sub_period_buckets(
    sprints: &[&Sprint],
    period: TimePeriod,
    now: DateTime<FixedOffset>,
) -> Vec<Bucket> {
    let offset = *now.offset();
    let labels = bucket_labels(period, now);
    let mut totals = vec![0u64; labels.len()];

    for sprint in sprints {
        let local = sprint.completed_at.with_timezone(&offset);
        let idx = match period {
            TimePeriod::Today => (local.hour() / 3) as usize,
            TimePeriod::ThisWeek | TimePeriod::LastWeek => {
                local.weekday().num_days_from_monday() as usize
            }
            TimePeriod::ThisMonth | TimePeriod::LastMonth => (local.day() - 1) as usize,
            TimePeriod::ThisYear => local.month0() as usize,
        };
        if let Some(total) = totals.get_mut(idx) {
            *total += sprint.duration_seconds as u64;
        }
    }

    labels
        .into_iter()
        .enumerate()
        .map(|(idx, label)| {
            let future = is_future_bucket(idx, period, now);
            make_bucket(label, totals[idx], future, period)
        })
        .collect()
}

fn make_bucket(label: String, seconds: u64, future: bool, period: TimePeriod) -> Bucket {
    let display = if seconds > 0 {
        format_duration(seconds)
    } else {
        String::new()
    };
    let labelled_period = matches!(
        period,
        TimePeriod::Today | TimePeriod::ThisWeek | TimePeriod::LastWeek
    );
    Bucket {
        label,
        seconds,
        display,
        future,
        show_value: labelled_period && seconds > 0 && !future,
    }
}

fn bucket_labels(period: TimePeriod, now: DateTime<FixedOffset>) -> Vec<String> {
    match period {
        TimePeriod::Today => HOUR_BLOCK_LABELS.iter().map(|s| s.to_string()).collect(),
        TimePeriod::ThisWeek | TimePeriod::LastWeek => {
            WEEKDAY_LABELS.iter().map(|s| s.to_string()).collect()
        }
        TimePeriod::ThisMonth | TimePeriod::LastMonth => {
            // Pre-seed a bucket for every calendar day of the month
            let days = days_in_chart_month(period, now.date_naive());
            (1..=days).map(|d| format!("{:02}", d)).collect()
        }
        TimePeriod::ThisYear => MONTH_LABELS.iter().map(|s| s.to_string()).collect(),
    }
}

fn days_in_chart_month(period: TimePeriod, today: NaiveDate) -> u32 {
    let first = match period {
        TimePeriod::LastMonth => {
            let this_first = today.with_day(1).unwrap();
            (this_first - Duration::days(1)).with_day(1).unwrap()
        }
        _ => today.with_day(1).unwrap(),
    };
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1).unwrap()
    };
    (next - first).num_days() as u32
}

fn is_future_bucket(idx: usize, period: TimePeriod, now: DateTime<FixedOffset>) -> bool {
    match period {
        TimePeriod::Today => (idx as u32) * 3 > now.hour(),
        TimePeriod::ThisWeek => idx as u32 > now.weekday().num_days_from_monday(),
        TimePeriod::ThisMonth => (idx as u32) + 1 > now.day(),
        TimePeriod::ThisYear => idx as u32 > now.month0(),
        // Past periods have no future buckets
        TimePeriod::LastWeek | TimePeriod::LastMonth => false,
    }
}
