//! Review repository.

use super::{Database, RepositoryError};
use crate::models::{Review, ReviewSort};

/// Repository for posted reviews.
pub struct ReviewRepository<'a> {
    db: &'a Database,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All reviews in the requested order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the reviews collection cannot be read.
    pub fn list(&self, sort: ReviewSort) -> Result<Vec<Review>, RepositoryError> {
        let mut reviews = self.db.store().load_reviews()?;
        sort.apply(&mut reviews);
        Ok(reviews)
    }

    /// Append a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` for storage failures.
    pub fn create(&self, review: Review) -> Result<(), RepositoryError> {
        let _guard = self.db.write_guard();

        let mut reviews = self.db.store().load_reviews()?;
        reviews.push(review);
        self.db.store().save_reviews(&reviews)
    }
}
