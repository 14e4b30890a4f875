//! Session middleware configuration.
//!
//! Sessions live in process memory; the cookie only carries a signed id.
//! Restarting the server logs everyone out.

use secrecy::ExposeSecret;
use tower_sessions::{
    Expiry, MemoryStore, SessionManagerLayer,
    cookie::{Key, SameSite, time::Duration},
};

use crate::config::ReviewsConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "reviews_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// The session secret could not be turned into a signing key.
#[derive(Debug, thiserror::Error)]
#[error("session secret is too short to derive a signing key")]
pub struct SessionKeyError;

/// Create the session layer with an in-memory store and signed cookies.
///
/// # Errors
///
/// Returns `SessionKeyError` if the session secret is shorter than 64 bytes.
pub fn create_session_layer(
    config: &ReviewsConfig,
) -> Result<SessionManagerLayer<MemoryStore, tower_sessions::service::SignedCookie>, SessionKeyError>
{
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|_| SessionKeyError)?;

    Ok(SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
