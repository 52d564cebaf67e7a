//! Sprint endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{filter_sprints, format_duration, TimePeriod};
use crate::api::state::AppState;
use crate::api::{ApiError, AuthUser};
use crate::models::{NewSprint, Project, ProjectId, Sprint, TimerKind};
use crate::storage::SprintUpdate;

use super::local_now;

/// Listings stop here no matter how much history exists.
const MAX_LISTING: usize = 500;

/// Name shown for sprints whose project has been deleted.
const DELETED_PROJECT_NAME: &str = "Deleted project";

/// A sprint as the client sees it: the record plus its resolved
/// project name and formatted duration.
#[derive(Debug, Serialize)]
pub struct SprintView {
    #[serde(flatten)]
    pub sprint: Sprint,
    pub project_name: String,
    pub duration: String,
}

fn to_view(sprint: Sprint, projects: &[Project]) -> SprintView {
    let project_name = projects
        .iter()
        .find(|p| p.id == sprint.project_id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| DELETED_PROJECT_NAME.to_string());
    let duration = format_duration(sprint.duration_seconds as u64);
    SprintView {
        sprint,
        project_name,
        duration,
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub period: Option<TimePeriod>,
    pub project_id: Option<String>,
    pub tz_offset: Option<i32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SprintsResponse {
    pub sprints: Vec<SprintView>,
    pub total: usize,
}

/// List sprints, most recently completed first, optionally narrowed to
/// one period and/or project.
pub async fn list_sprints(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<SprintsResponse>, ApiError> {
    let all = state.store.list_sprints(&user.id);
    let projects = state.store.list_projects(&user.id);

    let selected: Vec<Sprint> = match query.period {
        Some(period) => {
            let now = local_now(query.tz_offset)?;
            let project_id = query.project_id.as_deref().map(ProjectId::from);
            filter_sprints(&all, period, project_id.as_ref(), now)
                .into_iter()
                .cloned()
                .collect()
        }
        None => match &query.project_id {
            Some(project_id) => {
                let wanted: ProjectId = project_id.as_str().into();
                all.into_iter().filter(|s| s.project_id == wanted).collect()
            }
            None => all,
        },
    };

    let total = selected.len();
    let limit = query.limit.unwrap_or(MAX_LISTING).min(MAX_LISTING);
    let sprints = selected
        .into_iter()
        .take(limit)
        .map(|s| to_view(s, &projects))
        .collect();

    Ok(Json(SprintsResponse { sprints, total }))
}

#[derive(Debug, Deserialize)]
pub struct CreateSprintRequest {
    /// Attach to an existing project by id...
    pub project_id: Option<String>,
    /// ...or by name, creating the project if it doesn't exist yet.
    pub project_name: Option<String>,
    pub duration_seconds: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub mode: TimerKind,
    pub notes: Option<String>,
}

pub async fn create_sprint(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateSprintRequest>,
) -> Result<(StatusCode, Json<SprintView>), ApiError> {
    let project = match (&request.project_id, &request.project_name) {
        (Some(id), _) => {
            let id: ProjectId = id.as_str().into();
            state
                .store
                .get_project(&user.id, &id)
                .ok_or_else(|| ApiError::NotFound("project".to_string()))?
        }
        (None, Some(name)) => match state.store.find_project_by_name(&user.id, name) {
            Some(project) => project,
            None => state.store.create_project(&user.id, name)?,
        },
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either project_id or project_name is required".to_string(),
            ))
        }
    };

    let draft = NewSprint {
        project_id: project.id.clone(),
        duration_seconds: request.duration_seconds,
        started_at: request.started_at,
        completed_at: request.completed_at,
        mode: request.mode,
        notes: request
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    };

    let sprint = state.store.add_sprint(&user.id, draft)?;
    let projects = state.store.list_projects(&user.id);
    Ok((StatusCode::CREATED, Json(to_view(sprint, &projects))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSprintRequest {
    pub project_id: Option<String>,
    /// Manual correction of the recorded duration; must stay > 0.
    pub duration_seconds: Option<u32>,
    /// Present-but-empty clears the notes.
    pub notes: Option<String>,
}

pub async fn update_sprint(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSprintRequest>,
) -> Result<Json<SprintView>, ApiError> {
    let project_id = match request.project_id {
        Some(pid) => {
            let pid: ProjectId = pid.into();
            // Reassignment must target a live project of this user
            state
                .store
                .get_project(&user.id, &pid)
                .ok_or_else(|| ApiError::NotFound("project".to_string()))?;
            Some(pid)
        }
        None => None,
    };

    let update = SprintUpdate {
        project_id,
        duration_seconds: request.duration_seconds,
        notes: request.notes.map(Some),
    };
    let sprint = state.store.update_sprint(&user.id, &id.into(), update)?;
    let projects = state.store.list_projects(&user.id);
    Ok(Json(to_view(sprint, &projects)))
}

pub async fn delete_sprint(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_sprint(&user.id, &id.into())?;
    Ok(StatusCode::NO_CONTENT)
}
