//! Duration formatting and summary metrics.

use serde::Serialize;

use crate::models::Sprint;

/// Render a duration in seconds as `"{h}h {m}m"`, or `"{m}m"` below an
/// hour. Integer truncation, no rounding. This is the one canonical
/// implementation; analytics, chart labels, and sprint listings all go
/// through it.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Aggregate metrics over a filtered sprint set.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryMetrics {
    pub total_seconds: u64,
    pub total_time: String,
    pub average_seconds: u64,
    pub average_sprint: String,
    pub sprint_count: u32,
}

/// Compute totals, mean sprint length (0 for an empty set), and count.
pub fn compute_metrics(sprints: &[&Sprint]) -> SummaryMetrics {
    let total_seconds: u64 = sprints.iter().map(|s| s.duration_seconds as u64).sum();
    let sprint_count = sprints.len() as u32;
    let average_seconds = if sprint_count > 0 {
        total_seconds / sprint_count as u64
    } else {
        0
    };

    SummaryMetrics {
        total_seconds,
        total_time: format_duration(total_seconds),
        average_seconds,
        average_sprint: format_duration(average_seconds),
        sprint_count,
    }
}
