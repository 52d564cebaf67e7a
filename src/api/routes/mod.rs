//! Route handlers.

use chrono::{DateTime, FixedOffset, Utc};

use crate::api::ApiError;

pub mod analytics;
pub mod auth;
pub mod health;
pub mod projects;
pub mod sprints;

#[cfg(test)]
pub mod test_support;

/// Resolve a `tz_offset` query parameter (minutes east of UTC) into the
/// caller's current local time. Defaults to UTC.
pub(crate) fn local_now(tz_offset: Option<i32>) -> Result<DateTime<FixedOffset>, ApiError> {
    let minutes = tz_offset.unwrap_or(0);
    let offset = minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid tz_offset: {}", minutes)))?;
    Ok(Utc::now().with_timezone(&offset))
}
