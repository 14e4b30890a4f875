//! Authentication service.
//!
//! Provides email/password signup gated by an emailed verification code,
//! and password login for verified users.

mod error;
mod legacy;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use school_reviews_core::Email;

use crate::db::{Database, RepositoryError, UserRepository};
use crate::models::{PendingVerification, User};
use crate::services::email::{EmailService, generate_verification_code};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw signup form input.
#[derive(Debug, Clone, Copy)]
pub struct SignupRequest<'a> {
    /// Email as typed; normalized before use.
    pub email: &'a str,
    /// Surrounding whitespace is ignored, as for the confirmation.
    pub password: &'a str,
    /// `None` when the form has no confirmation field.
    pub confirm_password: Option<&'a str>,
}

/// Authentication service.
///
/// Handles signup, code verification and login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    email: Option<&'a EmailService>,
    allowed_domain: Option<&'a str>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    ///
    /// Without an `email` service, verification codes are written to the log
    /// instead of being sent.
    #[must_use]
    pub const fn new(
        db: &'a Database,
        email: Option<&'a EmailService>,
        allowed_domain: Option<&'a str>,
    ) -> Self {
        Self {
            users: UserRepository::new(db),
            email,
            allowed_domain,
        }
    }

    /// Start a signup: validate input, store a pending verification and send
    /// its code.
    ///
    /// Returns the normalized email the code was sent to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::DomainNotAllowed` if the email is outside the allowed domain.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    /// Returns `AuthError::EmailDelivery` if the code could not be sent. The
    /// pending verification is kept in that case.
    pub async fn sign_up(&self, request: &SignupRequest<'_>) -> Result<Email, AuthError> {
        let email = Email::normalize(request.email)?;

        if let Some(domain) = self.allowed_domain
            && !email.has_domain(domain)
        {
            return Err(AuthError::DomainNotAllowed(
                domain.trim_start_matches('@').to_owned(),
            ));
        }

        let password = request.password.trim();
        if let Some(confirm) = request.confirm_password
            && confirm.trim() != password
        {
            return Err(AuthError::PasswordMismatch);
        }

        validate_password(password)?;

        if self.users.exists(&email)? {
            return Err(AuthError::UserAlreadyExists);
        }

        let code = generate_verification_code();
        let pending = PendingVerification {
            email: email.clone(),
            password_hash: hash_password(password)?,
            code: code.clone(),
        };

        self.users.create_pending(pending).map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        match self.email {
            Some(service) => service.send_verification_code(&email, &code).await?,
            None => {
                tracing::warn!(
                    email = %email,
                    code = %code,
                    "SMTP not configured, verification code not sent"
                );
            }
        }

        tracing::info!(email = %email, "Pending verification created");
        Ok(email)
    }

    /// Check a submitted code and, if it matches, create the user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IncorrectCode` if no pending verification matches.
    pub fn verify(&self, email: &Email, code: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .complete_verification(email, code)?
            .ok_or(AuthError::IncorrectCode)?;

        tracing::info!(email = %user.email, "User verified");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong,
    /// including malformed or unknown emails.
    pub fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::normalize(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .get_by_email(&email)?
            .ok_or(AuthError::InvalidCredentials)?;

        let password = password.trim();
        if legacy::is_werkzeug_hash(&user.password_hash) {
            if !legacy::verify_werkzeug_hash(password, &user.password_hash) {
                return Err(AuthError::InvalidCredentials);
            }
            return Ok(self.upgrade_password_hash(user, password));
        }

        verify_password(password, &user.password_hash)?;

        Ok(user)
    }

    /// Replace a werkzeug hash with an Argon2 one after a successful login.
    ///
    /// Failures are logged; the login itself still succeeds.
    fn upgrade_password_hash(&self, mut user: User, password: &str) -> User {
        let hash = match hash_password(password) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(email = %user.email, error = %e, "Failed to rehash legacy password");
                return user;
            }
        };

        match self.users.update_password_hash(&user.email, &hash) {
            Ok(()) => {
                tracing::info!(email = %user.email, "Upgraded legacy password hash");
                user.password_hash = hash;
            }
            Err(e) => {
                tracing::warn!(email = %user.email, error = %e, "Failed to store upgraded password hash");
            }
        }

        user
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// Stored values that are not PHC strings never verify. Werkzeug hashes
/// are checked by [`legacy`] before this is reached.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::MemoryStore;

    const DOMAIN: &str = "education.nsw.gov.au";

    fn setup() -> (Arc<MemoryStore>, Database) {
        let store = Arc::new(MemoryStore::new());
        let db = Database::from_arc(store.clone());
        (store, db)
    }

    fn request<'a>(email: &'a str, password: &'a str) -> SignupRequest<'a> {
        SignupRequest {
            email,
            password,
            confirm_password: Some(password),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_plaintext_stored_password_never_verifies() {
        assert!(verify_password("hunter22", "hunter22").is_err());
    }

    // werkzeug.security.generate_password_hash("correct-horse", method="pbkdf2:sha256:1000")
    const WERKZEUG_HASH: &str = "pbkdf2:sha256:1000$SBBlDSC02z9ruVgZ$4db8615a3d94fa1c81b8d92d7c71a9e1b988e30d5cd55ebf04e89969f79fa3cf";

    #[test]
    fn test_werkzeug_user_logs_in_and_is_rehashed() {
        let email = Email::parse("old@education.nsw.gov.au").unwrap();
        let store = Arc::new(MemoryStore::new().with_users(vec![User {
            email: email.clone(),
            password_hash: WERKZEUG_HASH.to_string(),
        }]));
        let db = Database::from_arc(store.clone());
        let auth = AuthService::new(&db, None, None);

        assert!(matches!(
            auth.login("old@education.nsw.gov.au", "wrong-horse"),
            Err(AuthError::InvalidCredentials)
        ));
        assert_eq!(store.users().first().unwrap().password_hash, WERKZEUG_HASH);

        let user = auth.login("old@education.nsw.gov.au", "correct-horse").unwrap();
        assert_eq!(user.email, email);
        assert!(user.password_hash.starts_with("$argon2"));

        let stored = store.users();
        assert_eq!(stored.len(), 1);
        let stored_hash = &stored.first().unwrap().password_hash;
        assert_eq!(stored_hash, &user.password_hash);
        assert!(verify_password("correct-horse", stored_hash).is_ok());

        // Later logins go through Argon2
        auth.login("old@education.nsw.gov.au", "correct-horse").unwrap();
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[tokio::test]
    async fn test_sign_up_creates_pending_only() {
        let (store, db) = setup();
        let auth = AuthService::new(&db, None, Some(DOMAIN));

        let email = auth
            .sign_up(&request("  Student@Education.NSW.gov.au ", "password1"))
            .await
            .unwrap();

        assert_eq!(email.as_str(), "student@education.nsw.gov.au");
        assert!(store.users().is_empty());

        let pending = store.pending();
        assert_eq!(pending.len(), 1);
        let record = pending.first().unwrap();
        assert_eq!(record.email, email);
        assert_eq!(record.code.len(), 6);
        assert!(verify_password("password1", &record.password_hash).is_ok());
    }

    #[tokio::test]
    async fn test_sign_up_validation_order() {
        let (store, db) = setup();
        let auth = AuthService::new(&db, None, Some(DOMAIN));

        let err = auth.sign_up(&request("nope", "password1")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));

        let err = auth
            .sign_up(&request("a@gmail.com", "password1"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Email must end with @education.nsw.gov.au.");

        let err = auth
            .sign_up(&SignupRequest {
                email: "a@education.nsw.gov.au",
                password: "password1",
                confirm_password: Some("password2"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));

        let err = auth
            .sign_up(&request("a@education.nsw.gov.au", "short"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));

        assert!(store.pending().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_without_domain_restriction() {
        let (store, db) = setup();
        let auth = AuthService::new(&db, None, None);

        auth.sign_up(&request("a@gmail.com", "password1")).await.unwrap();
        assert_eq!(store.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_up_rejects_registered_email() {
        let (store, db) = setup();
        let auth = AuthService::new(&db, None, Some(DOMAIN));

        auth.sign_up(&request("a@education.nsw.gov.au", "password1"))
            .await
            .unwrap();
        let code = store.pending().first().unwrap().code.clone();
        let email = Email::parse("a@education.nsw.gov.au").unwrap();
        auth.verify(&email, &code).unwrap();

        let err = auth
            .sign_up(&request("A@education.nsw.gov.au", "password2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(err.user_message(), "Email is already registered.");
    }

    #[tokio::test]
    async fn test_verify_then_login() {
        let (store, db) = setup();
        let auth = AuthService::new(&db, None, Some(DOMAIN));

        let email = auth
            .sign_up(&request("a@education.nsw.gov.au", "password1"))
            .await
            .unwrap();
        let code = store.pending().first().unwrap().code.clone();

        assert!(matches!(
            auth.verify(&email, "not-it"),
            Err(AuthError::IncorrectCode)
        ));
        assert!(store.users().is_empty());

        let user = auth.verify(&email, &format!(" {code} ")).unwrap();
        assert_eq!(user.email, email);
        assert!(store.pending().is_empty());

        let logged_in = auth.login("A@Education.nsw.gov.au", " password1 ").unwrap();
        assert_eq!(logged_in.email, email);
    }

    #[test]
    fn test_login_failures_are_uniform() {
        let (_store, db) = setup();
        let auth = AuthService::new(&db, None, None);

        for (email, password) in [("not an email", "x"), ("ghost@education.nsw.gov.au", "x")] {
            let err = auth.login(email, password).unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
            assert_eq!(err.user_message(), "Invalid login credentials.");
        }
    }
}
