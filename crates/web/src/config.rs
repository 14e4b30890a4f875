//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `REVIEWS_SESSION_SECRET` - Session cookie signing key (min 64 chars, high entropy)
//!
//! ## Optional
//! - `REVIEWS_HOST` - Bind address (default: 127.0.0.1)
//! - `REVIEWS_PORT` - Listen port (default: 3000)
//! - `REVIEWS_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `REVIEWS_DATA_DIR` - Directory holding the JSON data files (default: .)
//! - `REVIEWS_SITE_NAME` - Name used in emails and page titles
//! - `REVIEWS_ALLOWED_EMAIL_DOMAIN` - Signup domain restriction
//!   (default: education.nsw.gov.au, empty to allow any domain)
//! - `SMTP_HOST` - Enables email delivery when set
//! - `SMTP_PORT` - SMTP over TLS port (default: 465)
//! - `SMTP_USERNAME` - SMTP login
//! - `SMTP_PASSWORD` / `SMTP_PASSWORD_FILE` - SMTP password, inline or read from a file
//! - `SMTP_FROM_ADDRESS` - Sender address (default: `SMTP_USERNAME`)
//! - `SMTP_FROM_NAME` - Sender display name
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Signing keys for cookies must be at least 64 bytes.
pub const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_SITE_NAME: &str = "RouseHillHighSchool.com";
const DEFAULT_ALLOWED_DOMAIN: &str = "education.nsw.gov.au";
const DEFAULT_FROM_NAME: &str = "Rouse Hill High School";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("Could not read {0}: {1}")]
    SecretFile(String, std::io::Error),
}

/// Review site configuration.
#[derive(Debug, Clone)]
pub struct ReviewsConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Session cookie signing secret
    pub session_secret: SecretString,
    /// Directory holding `users.json`, `reviews.json` and `pending_verifications.json`
    pub data_dir: PathBuf,
    /// Site name shown in emails and pages
    pub site_name: String,
    /// Signups must use an address at this domain (None allows any)
    pub allowed_email_domain: Option<String>,
    /// SMTP settings (None logs verification codes instead of sending them)
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// SMTP configuration for verification emails.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port (implicit TLS)
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
    /// Email sender display name
    pub from_name: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// Source of configuration values, keyed by variable name.
struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        (self.lookup)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

impl ReviewsConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the session secret fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    ///
    /// # Errors
    ///
    /// Same as [`ReviewsConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        let host = vars.parsed::<IpAddr>("REVIEWS_HOST", "127.0.0.1")?;
        let port = vars.parsed::<u16>("REVIEWS_PORT", "3000")?;
        let base_url = vars.or_default("REVIEWS_BASE_URL", "http://localhost:3000");
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("REVIEWS_BASE_URL".to_string(), e.to_string())
        })?;

        let session_secret = SecretString::from(vars.required("REVIEWS_SESSION_SECRET")?);
        validate_session_secret(&session_secret, "REVIEWS_SESSION_SECRET")?;
        validate_secret_strength(session_secret.expose_secret(), "REVIEWS_SESSION_SECRET")?;

        // An explicitly empty domain disables the restriction.
        let allowed_email_domain = match (vars.lookup)("REVIEWS_ALLOWED_EMAIL_DOMAIN") {
            Some(domain) if domain.trim().is_empty() => None,
            Some(domain) => Some(domain.trim().trim_start_matches('@').to_lowercase()),
            None => Some(DEFAULT_ALLOWED_DOMAIN.to_string()),
        };

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            data_dir: PathBuf::from(vars.or_default("REVIEWS_DATA_DIR", ".")),
            site_name: vars.or_default("REVIEWS_SITE_NAME", DEFAULT_SITE_NAME),
            allowed_email_domain,
            email: EmailConfig::from_vars(&vars)?,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: vars.parsed("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: vars.parsed("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (controls the Secure cookie flag).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        Url::parse(&self.base_url).is_ok_and(|url| url.scheme() == "https")
    }
}

impl EmailConfig {
    fn from_vars<F>(vars: &Vars<F>) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(smtp_host) = vars.optional("SMTP_HOST") else {
            return Ok(None);
        };

        let smtp_username = vars.required("SMTP_USERNAME")?;
        let smtp_password = match vars.optional("SMTP_PASSWORD") {
            Some(password) => SecretString::from(password),
            None => {
                let path = vars.required("SMTP_PASSWORD_FILE").map_err(|_| {
                    ConfigError::MissingEnvVar("SMTP_PASSWORD or SMTP_PASSWORD_FILE".to_string())
                })?;
                read_secret_file(&path)?
            }
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port: vars.parsed("SMTP_PORT", "465")?,
            from_address: vars.or_default("SMTP_FROM_ADDRESS", &smtp_username),
            from_name: vars.or_default("SMTP_FROM_NAME", DEFAULT_FROM_NAME),
            smtp_username,
            smtp_password,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Read a secret from a file, trimming surrounding whitespace.
fn read_secret_file(path: &str) -> Result<SecretString, ConfigError> {
    std::fs::read_to_string(path)
        .map(|contents| SecretString::from(contents.trim().to_string()))
        .map_err(|e| ConfigError::SecretFile(path.to_string(), e))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
