//! In-memory record store.
//!
//! Keeps each collection in a `Vec` behind a mutex. Used by tests and for
//! running the site without touching the filesystem.

use std::sync::{Mutex, PoisonError};

use super::{RecordStore, RepositoryError};
use crate::models::{PendingVerification, Review, User};

/// Record store holding everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    pending: Mutex<Vec<PendingVerification>>,
    reviews: Mutex<Vec<Review>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with users.
    #[must_use]
    pub fn with_users(self, users: Vec<User>) -> Self {
        *lock(&self.users) = users;
        self
    }

    /// Seed the store with reviews.
    #[must_use]
    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        *lock(&self.reviews) = reviews;
        self
    }

    /// Snapshot of the stored users.
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        lock(&self.users).clone()
    }

    /// Snapshot of the stored pending verifications.
    #[must_use]
    pub fn pending(&self) -> Vec<PendingVerification> {
        lock(&self.pending).clone()
    }

    /// Snapshot of the stored reviews.
    #[must_use]
    pub fn reviews(&self) -> Vec<Review> {
        lock(&self.reviews).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordStore for MemoryStore {
    fn load_users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.users())
    }

    fn save_users(&self, users: &[User]) -> Result<(), RepositoryError> {
        *lock(&self.users) = users.to_vec();
        Ok(())
    }

    fn load_pending(&self) -> Result<Vec<PendingVerification>, RepositoryError> {
        Ok(self.pending())
    }

    fn save_pending(&self, pending: &[PendingVerification]) -> Result<(), RepositoryError> {
        *lock(&self.pending) = pending.to_vec();
        Ok(())
    }

    fn load_reviews(&self) -> Result<Vec<Review>, RepositoryError> {
        Ok(self.reviews())
    }

    fn save_reviews(&self, reviews: &[Review]) -> Result<(), RepositoryError> {
        *lock(&self.reviews) = reviews.to_vec();
        Ok(())
    }
}
