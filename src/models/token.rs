//! One-time sign-in code records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How long an emailed code stays valid.
pub const CODE_TTL_MINUTES: i64 = 10;

/// Failed verification attempts allowed before a code is burned.
pub const MAX_ATTEMPTS: u32 = 5;

/// A pending one-time sign-in code. Only the digest of the code is
/// stored; the plaintext goes out in the email and nowhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailToken {
    /// Email the code was sent to (lowercased)
    pub email: String,

    /// SHA-256 hex digest of "{email}:{code}"
    pub token_hash: String,

    /// When the code stops being accepted
    pub expires_at: DateTime<Utc>,

    /// Failed verification attempts so far
    pub attempts: u32,
}

impl EmailToken {
    /// Create a token record for a freshly issued code.
    pub fn new(email: String, code: &str, now: DateTime<Utc>) -> Self {
        let token_hash = hash_code(&email, code);
        Self {
            email,
            token_hash,
            expires_at: now + chrono::Duration::minutes(CODE_TTL_MINUTES),
            attempts: 0,
        }
    }

    /// Whether the code has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Whether the attempt budget is used up.
    pub fn is_burned(&self) -> bool {
        self.attempts >= MAX_ATTEMPTS
    }

    /// Check a submitted code against the stored digest.
    pub fn matches(&self, code: &str) -> bool {
        hash_code(&self.email, code) == self.token_hash
    }
}

/// Digest an email/code pair.
pub fn hash_code(email: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}
