//! School Reviews web library.
//!
//! Everything the `school-reviews` binary serves, exposed as a library so
//! the router can be driven from integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
