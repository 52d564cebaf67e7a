//! Passwordless sign-in.
//!
//! Flow: the user submits an email, we generate a 6-digit code, store
//! its digest, and mail the plaintext. Submitting the code back within
//! its lifetime (and attempt budget) upserts the account and yields a
//! session token. The same response goes back for unknown and known
//! emails so the endpoint can't be used to probe for accounts.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::email::{EmailError, Mailer};
use crate::models::{validate_email, EmailToken, User};
use crate::storage::{Store, StoreError};

mod session;

pub use session::{
    build_session_cookie, clear_session_cookie, create_session_token, token_from_cookie_header,
    verify_session_token, SessionError, SESSION_COOKIE,
};

/// Errors from the sign-in flow.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("No sign-in code is pending for this email")]
    NoPendingCode,

    #[error("The code has expired; request a new one")]
    CodeExpired,

    #[error("Incorrect code")]
    CodeMismatch,

    #[error("Too many incorrect attempts; request a new code")]
    TooManyAttempts,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Generate a 6-digit sign-in code.
fn generate_code() -> String {
    // UUIDv4 gives 122 random bits; fold them into the 100000..=999999 range
    let n = uuid::Uuid::new_v4().as_u128() % 900_000 + 100_000;
    n.to_string()
}

/// Issue a fresh code for an email and send it out. Replaces any
/// outstanding code for the same address.
pub async fn issue_code(
    store: &Store,
    mailer: &Arc<dyn Mailer>,
    email: &str,
) -> Result<(), AuthError> {
    if !validate_email(email) {
        return Err(AuthError::InvalidEmail);
    }
    let email = email.trim().to_lowercase();

    let code = generate_code();
    let token = EmailToken::new(email.clone(), &code, Utc::now());
    store.save_token(token)?;

    mailer.send_signin_code(&email, &code).await?;
    info!("Issued sign-in code to {} via {}", email, mailer.name());
    Ok(())
}

/// Verify a submitted code. On success the token is consumed and the
/// account is created or refreshed.
pub fn verify_code(store: &Store, email: &str, code: &str) -> Result<User, AuthError> {
    let email = email.trim().to_lowercase();
    let token = store
        .token_for_email(&email)
        .ok_or(AuthError::NoPendingCode)?;

    if token.is_expired(Utc::now()) {
        store.remove_token(&email)?;
        return Err(AuthError::CodeExpired);
    }
    if token.is_burned() {
        store.remove_token(&email)?;
        return Err(AuthError::TooManyAttempts);
    }
    if !token.matches(code.trim()) {
        store.record_token_attempt(&email)?;
        warn!("Incorrect sign-in code for {}", email);
        return Err(AuthError::CodeMismatch);
    }

    store.remove_token(&email)?;
    let user = store.upsert_user_by_email(&email)?;
    info!("Verified sign-in for {}", email);
    Ok(user)
}
