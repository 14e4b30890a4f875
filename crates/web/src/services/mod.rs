//! Business logic services.
//!
//! - `auth` - signup with emailed codes, verification, password login
//! - `email` - SMTP delivery of verification codes

pub mod auth;
pub mod email;

pub use auth::{AuthError, AuthService, SignupRequest};
pub use email::{EmailDeliveryError, EmailService, generate_verification_code};
