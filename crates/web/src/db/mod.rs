//! Record storage for the review site.
//!
//! # Collections
//!
//! State is three flat lists, each persisted as one JSON file:
//!
//! - `users.json` - verified users ([`User`])
//! - `pending_verifications.json` - signups awaiting their code ([`PendingVerification`])
//! - `reviews.json` - posted reviews ([`Review`])
//!
//! # Layers
//!
//! - [`RecordStore`] - load/save of whole collections. [`JsonFileStore`] is the
//!   production backend, [`MemoryStore`] backs tests.
//! - [`Database`] - shared handle owning the store and the write lock that
//!   serializes read-modify-write sequences within the process.
//! - [`UserRepository`] / [`ReviewRepository`] - the operations route
//!   handlers and services actually use.

pub mod json_file;
pub mod memory;
pub mod reviews;
pub mod users;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::models::{PendingVerification, Review, User};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use reviews::ReviewRepository;
pub use users::UserRepository;

/// Errors from record storage.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Reading or writing a data file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Records could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Constraint violation (e.g., email already registered).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The record to update does not exist.
    #[error("record not found")]
    NotFound,
}

/// Whole-collection persistence for the three record types.
///
/// `load_*` returns every stored record in stored order; `save_*` replaces
/// the collection. Implementations do no locking of their own; callers go
/// through [`Database`].
pub trait RecordStore: Send + Sync {
    /// Load all verified users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backing storage cannot be read.
    fn load_users(&self) -> Result<Vec<User>, RepositoryError>;

    /// Replace all verified users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backing storage cannot be written.
    fn save_users(&self, users: &[User]) -> Result<(), RepositoryError>;

    /// Load all pending verifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backing storage cannot be read.
    fn load_pending(&self) -> Result<Vec<PendingVerification>, RepositoryError>;

    /// Replace all pending verifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backing storage cannot be written.
    fn save_pending(&self, pending: &[PendingVerification]) -> Result<(), RepositoryError>;

    /// Load all reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backing storage cannot be read.
    fn load_reviews(&self) -> Result<Vec<Review>, RepositoryError>;

    /// Replace all reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backing storage cannot be written.
    fn save_reviews(&self, reviews: &[Review]) -> Result<(), RepositoryError>;
}

/// Shared handle to the record store.
///
/// Cheaply cloneable. Holds the process-wide write lock so two requests
/// cannot interleave a load and a save of the same collection.
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn RecordStore>,
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Wrap a record store.
    #[must_use]
    pub fn new(store: impl RecordStore + 'static) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Wrap a record store that is already shared (e.g., so a test can keep
    /// a handle to inspect it).
    #[must_use]
    pub fn from_arc(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the underlying record store.
    #[must_use]
    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Acquire the write lock.
    ///
    /// The lock guards no data of its own, so a poisoned lock is still
    /// usable.
    pub(crate) fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
