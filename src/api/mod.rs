//! REST API endpoints.
//!
//! Axum-based HTTP API for sign-in, projects, sprints, and analytics.
//! Everything except `/api/auth/*` and `/api/health` requires a session.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{token_from_cookie_header, verify_session_token, AuthError};
use crate::models::User;
use crate::storage::StoreError;

pub mod routes;
pub mod state;

use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    AuthFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::AuthFailed(_) => (StatusCode::UNAUTHORIZED, "AUTH_FAILED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName(name) => {
                ApiError::Conflict(format!("A project named '{}' already exists", name))
            }
            StoreError::NotFound(what) => ApiError::NotFound(what.to_string()),
            StoreError::InvalidName(e) => ApiError::BadRequest(e.to_string()),
            StoreError::InvalidSprint(e) => ApiError::BadRequest(e.to_string()),
            StoreError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail => ApiError::BadRequest(err.to_string()),
            AuthError::NoPendingCode
            | AuthError::CodeExpired
            | AuthError::CodeMismatch
            | AuthError::TooManyAttempts => ApiError::AuthFailed(err.to_string()),
            AuthError::Store(e) => e.into(),
            AuthError::Email(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// The authenticated user, extracted from a bearer token or the
/// session cookie. Rejects with 401 when neither holds a valid session.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let cookie = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(token_from_cookie_header);

        let token = bearer.or(cookie).ok_or(ApiError::Unauthorized)?;
        let user_id = verify_session_token(token, &state.auth.session_secret)
            .map_err(|_| ApiError::Unauthorized)?;

        let user = state
            .store
            .get_user(&user_id)
            .ok_or(ApiError::Unauthorized)?;
        Ok(AuthUser(user))
    }
}

/// Build a CORS layer for the configured origin. `"*"` allows any.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match origin {
        "*" => AllowOrigin::any(),
        exact => match exact.parse() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("Invalid CORS origin '{}', allowing any", exact);
                AllowOrigin::any()
            }
        },
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/auth/signin", post(routes::auth::signin))
        .route("/api/auth/verify", post(routes::auth::verify))
        .route("/api/auth/session", get(routes::auth::session))
        .route("/api/auth/signout", post(routes::auth::signout))
        .route("/api/projects", get(routes::projects::list_projects))
        .route("/api/projects", post(routes::projects::create_project))
        .route("/api/projects/:id", put(routes::projects::rename_project))
        .route(
            "/api/projects/:id",
            delete(routes::projects::delete_project),
        )
        .route("/api/sprints", get(routes::sprints::list_sprints))
        .route("/api/sprints", post(routes::sprints::create_sprint))
        .route("/api/sprints/:id", patch(routes::sprints::update_sprint))
        .route("/api/sprints/:id", delete(routes::sprints::delete_sprint))
        .route("/api/analytics/summary", get(routes::analytics::summary))
        .route("/api/analytics/chart", get(routes::analytics::chart))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
