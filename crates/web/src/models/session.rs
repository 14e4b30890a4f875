//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use school_reviews_core::Email;

/// Session-stored user identity.
///
/// Users are keyed by email, so the email is the whole identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// The logged-in user's email address.
    pub email: Email,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the email awaiting its verification code.
    pub const VERIFY_EMAIL: &str = "verify_email";
}
