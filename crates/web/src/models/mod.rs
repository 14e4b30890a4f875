//! Domain models for the review site.
//!
//! - [`user`] - registered users and pending email verifications
//! - [`review`] - reviews and listing order
//! - [`session`] - identity stored in the session cookie

pub mod review;
pub mod session;
pub mod user;

pub use review::{Review, ReviewSort};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{PendingVerification, User};
