//! User account model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, UserId};

/// A user account, identified by email. No password; sign-in happens
/// via emailed one-time codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// Email address (lowercased)
    pub email: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the user last verified a sign-in code
    pub last_login_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh ID.
    pub fn new(email: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::generate(),
            email,
            created_at: now,
            last_login_at: now,
        }
    }
}

/// Basic email shape check. Full RFC validation is not the goal;
/// the one-time code round trip is the real proof of ownership.
pub fn validate_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
