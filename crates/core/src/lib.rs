//! School Reviews Core - Shared domain types.
//!
//! Types shared by the web binary and anything else that reads the
//! review site's data files:
//! - [`Email`] - normalized, validated email addresses
//! - [`ReviewId`] - opaque review identifiers
//! - [`StarRating`] - 1-5 star ratings for new reviews
//! - [`timestamp`] - serde helpers for the ISO timestamps stored on disk
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP, no templates.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
