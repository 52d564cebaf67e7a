//! Shared fixtures for route tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;

use crate::api::state::AppState;
use crate::auth::create_session_token;
use crate::config::AuthConfig;
use crate::email::ConsoleMailer;
use crate::events::EventBus;
use crate::models::User;
use crate::storage::{StorageConfig, Store};

pub fn test_state(temp_dir: &TempDir) -> AppState {
    let storage = StorageConfig::new(temp_dir.path().to_path_buf());
    let store = Store::open(storage, Arc::new(EventBus::default())).unwrap();
    AppState {
        store: Arc::new(store),
        mailer: Arc::new(ConsoleMailer),
        auth: Arc::new(AuthConfig::default()),
    }
}

/// Create an account directly and sign a session token for it, skipping
/// the email round trip.
pub fn verified_session(state: &AppState, email: &str) -> (String, User) {
    let user = state.store.upsert_user_by_email(email).unwrap();
    let token =
        create_session_token(&user.id, &state.auth.session_secret, state.auth.session_ttl_days)
            .unwrap();
    (token, user)
}

pub async fn read_json(resp: axum::response::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(resp).await
}

pub async fn get_json_auth(app: axum::Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(resp).await
}

pub async fn request_json_auth(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Value,
) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(resp).await
}

pub async fn delete_auth(app: axum::Router, uri: &str, token: &str) -> StatusCode {
    let resp = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    resp.status()
}
