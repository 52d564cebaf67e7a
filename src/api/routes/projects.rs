//! Project CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{ApiError, AuthUser};
use crate::models::Project;

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<Project>,
}

pub async fn list_projects(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Json<ProjectsResponse> {
    Json(ProjectsResponse {
        projects: state.store.list_projects(&user.id),
    })
}

#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub name: String,
}

pub async fn create_project(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<ProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.store.create_project(&user.id, &request.name)?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn rename_project(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .store
        .rename_project(&user.id, &id.into(), &request.name)?;
    Ok(Json(project))
}

pub async fn delete_project(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_project(&user.id, &id.into())?;
    Ok(StatusCode::NO_CONTENT)
}
