//! Analytics endpoints: period summaries and chart data.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::analytics::{
    axis_label, calculate_y_axis_domain, chart_buckets, compute_metrics, filter_sprints,
    max_bucket_seconds, AxisScale, Bucket, SummaryMetrics, TimePeriod,
};
use crate::api::state::AppState;
use crate::api::{ApiError, AuthUser};
use crate::models::ProjectId;

use super::local_now;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub period: TimePeriod,
    pub project_id: Option<String>,
    pub tz_offset: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub period: TimePeriod,
    #[serde(flatten)]
    pub metrics: SummaryMetrics,
}

/// Total time, mean sprint length, and sprint count for a period.
pub async fn summary(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let now = local_now(query.tz_offset)?;
    let sprints = state.store.list_sprints(&user.id);
    let project_id = query.project_id.as_deref().map(ProjectId::from);
    let selected = filter_sprints(&sprints, query.period, project_id.as_ref(), now);

    Ok(Json(SummaryResponse {
        period: query.period,
        metrics: compute_metrics(&selected),
    }))
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub period: TimePeriod,
    pub buckets: Vec<Bucket>,
    pub axis: ChartAxis,
}

#[derive(Debug, Serialize)]
pub struct ChartAxis {
    #[serde(flatten)]
    pub scale: AxisScale,
    pub labels: Vec<String>,
}

/// Bucketed chart data plus a ready-to-render y-axis.
pub async fn chart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ChartResponse>, ApiError> {
    let now = local_now(query.tz_offset)?;
    let sprints = state.store.list_sprints(&user.id);
    let projects = state.store.list_projects(&user.id);
    let project_id = query.project_id.as_deref().map(ProjectId::from);

    let selected = filter_sprints(&sprints, query.period, project_id.as_ref(), now);
    let buckets = chart_buckets(&selected, query.period, project_id.as_ref(), &projects, now);

    let scale = calculate_y_axis_domain(max_bucket_seconds(&buckets));
    let labels = scale
        .ticks
        .iter()
        .map(|&t| axis_label(t, scale.use_minutes))
        .collect();

    Ok(Json(ChartResponse {
        period: query.period,
        buckets,
        axis: ChartAxis { scale, labels },
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json_auth, test_state, verified_session};
    use crate::models::{NewSprint, TimerKind};
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    fn seed(
        state: &crate::api::state::AppState,
        user: &crate::models::User,
        project: &crate::models::Project,
        duration: u32,
        completed: chrono::DateTime<Utc>,
    ) {
        state
            .store
            .add_sprint(
                &user.id,
                NewSprint {
                    project_id: project.id.clone(),
                    duration_seconds: duration,
                    started_at: completed - Duration::seconds(duration as i64),
                    completed_at: completed,
                    mode: TimerKind::Countdown,
                    notes: None,
                },
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_summary_totals() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let (token, user) = verified_session(&state, "ada@example.com");
        let project = state.store.create_project(&user.id, "Writing").unwrap();

        let now = Utc::now();
        seed(&state, &user, &project, 1800, now);
        seed(&state, &user, &project, 900, now - Duration::minutes(5));

        let (status, body) = get_json_auth(
            build_router(state),
            "/api/analytics/summary?period=today",
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_seconds"], 2700);
        assert_eq!(body["total_time"], "45m");
        assert_eq!(body["average_seconds"], 1350);
        assert_eq!(body["sprint_count"], 2);
    }

    #[tokio::test]
    async fn test_summary_empty_period() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let (token, _) = verified_session(&state, "ada@example.com");

        let (status, body) = get_json_auth(
            build_router(state),
            "/api/analytics/summary?period=last-week",
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_seconds"], 0);
        assert_eq!(body["total_time"], "0m");
        assert_eq!(body["average_sprint"], "0m");
    }

    #[tokio::test]
    async fn test_summary_requires_period() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let (token, _) = verified_session(&state, "ada@example.com");

        let (status, _) =
            get_json_auth(build_router(state), "/api/analytics/summary", &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chart_project_view() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let (token, user) = verified_session(&state, "ada@example.com");
        let p1 = state.store.create_project(&user.id, "Writing").unwrap();
        let p2 = state.store.create_project(&user.id, "Design").unwrap();

        let now = Utc::now();
        seed(&state, &user, &p1, 1800, now);
        seed(&state, &user, &p2, 5400, now);

        let (status, body) = get_json_auth(
            build_router(state),
            "/api/analytics/chart?period=today",
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let buckets = body["buckets"].as_array().unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0]["label"], "Writing");
        assert_eq!(buckets[0]["seconds"], 1800);
        assert_eq!(buckets[1]["label"], "Design");
        assert_eq!(buckets[1]["display"], "1h 30m");

        // 5400s max -> 1800s steps up to 7200
        assert_eq!(body["axis"]["domain_max"], 7200);
        assert_eq!(body["axis"]["ticks"], json!([0, 1800, 3600, 5400, 7200]));
        assert_eq!(body["axis"]["use_minutes"], false);
        assert_eq!(body["axis"]["labels"], json!(["0h", "1h", "1h", "2h", "2h"]));
    }

    #[tokio::test]
    async fn test_chart_week_view_for_project() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let (token, user) = verified_session(&state, "ada@example.com");
        let project = state.store.create_project(&user.id, "Writing").unwrap();
        seed(&state, &user, &project, 900, Utc::now());

        let uri = format!(
            "/api/analytics/chart?period=this-week&project_id={}",
            project.id
        );
        let (status, body) = get_json_auth(build_router(state), &uri, &token).await;
        assert_eq!(status, StatusCode::OK);

        let buckets = body["buckets"].as_array().unwrap();
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0]["label"], "Mon");
        assert_eq!(buckets[6]["label"], "Sun");
        let total: u64 = buckets
            .iter()
            .map(|b| b["seconds"].as_u64().unwrap())
            .sum();
        assert_eq!(total, 900);
    }

    #[tokio::test]
    async fn test_chart_empty_axis_defaults_to_an_hour() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let (token, _) = verified_session(&state, "ada@example.com");

        let (status, body) = get_json_auth(
            build_router(state),
            "/api/analytics/chart?period=today",
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["axis"]["domain_max"], 3600);
        assert_eq!(body["axis"]["use_minutes"], true);
        assert_eq!(
            body["axis"]["labels"],
            json!(["0m", "15m", "30m", "45m", "60m"])
        );
    }

    #[tokio::test]
    async fn test_analytics_require_auth() {
        let temp_dir = TempDir::new().unwrap();
        let (status, _) = get_json_auth(
            build_router(test_state(&temp_dir)),
            "/api/analytics/summary?period=today",
            "bogus",
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
