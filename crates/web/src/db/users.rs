//! User and pending-verification repository.

use school_reviews_core::Email;

use super::{Database, RepositoryError};
use crate::models::{PendingVerification, User};

/// Repository for users and the signups waiting to become users.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the users collection cannot be read.
    pub fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let users = self.db.store().load_users()?;
        Ok(users.into_iter().find(|u| u.email == *email))
    }

    /// Whether a verified user exists for this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the users collection cannot be read.
    pub fn exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        Ok(self.get_by_email(email)?.is_some())
    }

    /// Record a signup awaiting verification.
    ///
    /// Earlier pending records for the same email are kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already belongs to a
    /// verified user.
    /// Returns `RepositoryError` for storage failures.
    pub fn create_pending(&self, pending: PendingVerification) -> Result<(), RepositoryError> {
        let _guard = self.db.write_guard();

        if self.exists(&pending.email)? {
            return Err(RepositoryError::Conflict("email already registered".to_owned()));
        }

        let mut all = self.db.store().load_pending()?;
        all.push(pending);
        self.db.store().save_pending(&all)
    }

    /// Replace the stored password hash of a verified user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    /// Returns `RepositoryError` for storage failures.
    pub fn update_password_hash(&self, email: &Email, hash: &str) -> Result<(), RepositoryError> {
        let _guard = self.db.write_guard();

        let mut users = self.db.store().load_users()?;
        let user = users
            .iter_mut()
            .find(|u| u.email == *email)
            .ok_or(RepositoryError::NotFound)?;
        hash.clone_into(&mut user.password_hash);

        self.db.store().save_users(&users)
    }

    /// All pending verifications for an email, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the pending collection cannot be read.
    pub fn get_pending(&self, email: &Email) -> Result<Vec<PendingVerification>, RepositoryError> {
        let pending = self.db.store().load_pending()?;
        Ok(pending.into_iter().filter(|p| p.email == *email).collect())
    }

    /// Turn a pending verification into a user if `code` matches.
    ///
    /// On a match, the user is appended (unless it already exists) and every
    /// pending record for the email is removed. Returns `None` and changes
    /// nothing when no pending record matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub fn complete_verification(
        &self,
        email: &Email,
        code: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let _guard = self.db.write_guard();

        let pending = self.db.store().load_pending()?;
        let Some(entry) = pending.iter().find(|p| p.matches(email, code)) else {
            return Ok(None);
        };

        let mut users = self.db.store().load_users()?;
        let user = if let Some(existing) = users.iter().find(|u| u.email == *email) {
            existing.clone()
        } else {
            let user = User {
                email: email.clone(),
                password_hash: entry.password_hash.clone(),
            };
            users.push(user.clone());
            self.db.store().save_users(&users)?;
            user
        };

        let remaining: Vec<PendingVerification> =
            pending.into_iter().filter(|p| p.email != *email).collect();
        self.db.store().save_pending(&remaining)?;

        Ok(Some(user))
    }
}
