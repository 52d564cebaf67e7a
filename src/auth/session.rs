//! Session tokens and cookies.
//!
//! A session is a signed HS256 JWT carrying the user id, delivered in
//! an HttpOnly cookie. The server keeps no session table; possession of
//! a validly signed, unexpired token is the session.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::UserId;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "st_session";

/// Errors from session token handling.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to sign session token: {0}")]
    Sign(jsonwebtoken::errors::Error),

    #[error("Invalid or expired session token")]
    Invalid,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Sign a session token for a user.
pub fn create_session_token(
    user_id: &UserId,
    secret: &str,
    ttl_days: i64,
) -> Result<String, SessionError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.as_str().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(SessionError::Sign)
}

/// Verify a session token and extract the user id. Signature and
/// expiry failures both collapse to [`SessionError::Invalid`].
pub fn verify_session_token(token: &str, secret: &str) -> Result<UserId, SessionError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| SessionError::Invalid)?;

    Ok(data.claims.sub.into())
}

/// Build the Set-Cookie value establishing a session.
pub fn build_session_cookie(token: &str, ttl_days: i64) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; Secure; SameSite=Lax",
        SESSION_COOKIE,
        token,
        ttl_days * 24 * 60 * 60
    )
}

/// Build the Set-Cookie value tearing a session down.
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; Secure; SameSite=Lax",
        SESSION_COOKIE
    )
}

/// Pull the session token out of a Cookie request header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}
