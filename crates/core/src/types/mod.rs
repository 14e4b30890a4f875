//! Core types for the review site.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod rating;
pub mod timestamp;

pub use email::{Email, EmailError};
pub use id::*;
pub use rating::{RatingError, StarRating};
