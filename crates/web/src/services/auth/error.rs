//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailDeliveryError;

/// Errors that can occur during signup, verification and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] school_reviews_core::EmailError),

    /// Email is outside the allowed signup domain.
    #[error("email must end with @{0}")]
    DomainNotAllowed(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// No pending verification matches the submitted code.
    #[error("incorrect verification code")]
    IncorrectCode,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The verification email could not be sent.
    #[error("email delivery failed: {0}")]
    EmailDelivery(#[from] EmailDeliveryError),

    /// Repository error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the error should be shown inline on the form that caused it
    /// rather than failing the request.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Repository(_) | Self::PasswordHash)
    }

    /// Inline message for the originating form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            Self::DomainNotAllowed(domain) => format!("Email must end with @{domain}."),
            Self::PasswordMismatch => "Passwords do not match.".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::UserAlreadyExists => "Email is already registered.".to_string(),
            Self::IncorrectCode => "Incorrect verification code".to_string(),
            Self::InvalidCredentials => "Invalid login credentials.".to_string(),
            Self::EmailDelivery(_) => {
                "Failed to send verification email. Please try again.".to_string()
            }
            Self::Repository(_) | Self::PasswordHash => "Something went wrong.".to_string(),
        }
    }
}
