//! User records.
//!
//! Both types are stored as-is in the JSON data files. The password hash is
//! serialized under the `password` key.

use serde::{Deserialize, Serialize};

use school_reviews_core::Email;

/// A verified user.
///
/// Created when a pending verification succeeds; never deleted. The hash
/// is rewritten once when a werkzeug-hashed account first logs in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique, lowercased email address.
    pub email: Email,
    /// Argon2 PHC string, or a werkzeug hash not yet upgraded.
    #[serde(rename = "password")]
    pub password_hash: String,
}

/// A signup waiting for its emailed code.
///
/// Several records may exist for one email if the user signs up repeatedly;
/// they are all removed once any of their codes is accepted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    /// Lowercased email address the code was sent to.
    pub email: Email,
    /// Argon2 PHC string, copied to the [`User`] on verification.
    #[serde(rename = "password")]
    pub password_hash: String,
    /// Six-digit code.
    pub code: String,
}

impl PendingVerification {
    /// Whether `code` (surrounding whitespace ignored) matches this record.
    #[must_use]
    pub fn matches(&self, email: &Email, code: &str) -> bool {
        self.email == *email && self.code == code.trim()
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Debug for PendingVerification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingVerification")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("code", &"[REDACTED]")
            .finish()
    }
}
