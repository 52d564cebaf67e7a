//! Period filtering, summary metrics, and chart bucketing.

mod chart;
mod metrics;
mod period;

pub use chart::{
    axis_label, calculate_y_axis_domain, chart_buckets, max_bucket_seconds, AxisScale, Bucket,
};
pub use metrics::{compute_metrics, format_duration, SummaryMetrics};
pub use period::{filter_sprints, period_range, TimePeriod};
