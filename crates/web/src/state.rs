//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ReviewsConfig;
use crate::db::Database;
use crate::services::auth::AuthService;
use crate::services::email::{EmailDeliveryError, EmailService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the record store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ReviewsConfig,
    db: Database,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Site configuration
    /// * `db` - Record store handle
    ///
    /// # Errors
    ///
    /// Returns an error if SMTP is configured but the mailer cannot be built.
    pub fn new(config: ReviewsConfig, db: Database) -> Result<Self, EmailDeliveryError> {
        let email = config
            .email
            .as_ref()
            .map(|email_config| EmailService::new(email_config, &config.site_name))
            .transpose()?;

        if email.is_none() {
            tracing::warn!("SMTP not configured, verification codes will only be logged");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { config, db, email }),
        })
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &ReviewsConfig {
        &self.inner.config
    }

    /// Get a reference to the record store handle.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Get the email service, if SMTP is configured.
    #[must_use]
    pub fn email_service(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            &self.inner.db,
            self.email_service(),
            self.inner.config.allowed_email_domain.as_deref(),
        )
    }
}
