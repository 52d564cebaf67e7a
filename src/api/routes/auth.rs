//! Sign-in endpoints.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{ApiError, AuthUser};
use crate::auth::{
    build_session_cookie, clear_session_cookie, create_session_token, issue_code, verify_code,
};
use crate::models::User;

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub message: &'static str,
}

/// Request a sign-in code. The response is identical for known and
/// unknown addresses so the endpoint can't enumerate accounts.
pub async fn signin(
    State(state): State<AppState>,
    Json(request): Json<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    issue_code(&state.store, &state.mailer, &request.email).await?;
    Ok(Json(SigninResponse {
        message: "If that address is valid, a sign-in code is on its way",
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub token: String,
    pub user: User,
}

/// Exchange an emailed code for a session. The token comes back both
/// in the body (for bearer-auth clients) and as the session cookie.
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Response, ApiError> {
    let user = verify_code(&state.store, &request.email, &request.code)?;

    let token = create_session_token(&user.id, &state.auth.session_secret, state.auth.session_ttl_days)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let cookie = build_session_cookie(&token, state.auth.session_ttl_days);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(VerifyResponse { token, user }),
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
}

/// Who am I, per the presented session.
pub async fn session(AuthUser(user): AuthUser) -> Json<SessionResponse> {
    Json(SessionResponse { user })
}

/// Tear the session cookie down. Stateless tokens can't be revoked
/// server-side; signout is the client discarding its copy.
pub async fn signout() -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(SigninResponse {
            message: "Signed out",
        }),
    )
        .into_response()
}
