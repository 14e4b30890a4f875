//! Email service for sending verification codes.
//!
//! Uses SMTP over implicit TLS via lettre, with Askama templates for the
//! text and HTML bodies.

use askama::Template;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use school_reviews_core::Email;

use crate::config::EmailConfig;

/// Subject line of the verification email.
pub const VERIFICATION_SUBJECT: &str = "Your Verification Code";

/// HTML template for verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeEmailHtml<'a> {
    code: &'a str,
    site_name: &'a str,
}

/// Plain text template for verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeEmailText<'a> {
    code: &'a str,
    site_name: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailDeliveryError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    site_name: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// The connection is not opened until the first message is sent.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured or the sender address
    /// is invalid.
    pub fn new(config: &EmailConfig, site_name: &str) -> Result<Self, EmailDeliveryError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        let address: Address = config
            .from_address
            .parse()
            .map_err(|_| EmailDeliveryError::InvalidAddress(config.from_address.clone()))?;

        Ok(Self {
            mailer,
            from: Mailbox::new(Some(config.from_name.clone()), address),
            site_name: site_name.to_owned(),
        })
    }

    /// Send a signup verification code.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification_code(
        &self,
        to: &Email,
        code: &str,
    ) -> Result<(), EmailDeliveryError> {
        let (text, html) = render_verification_code(code, &self.site_name)?;
        self.send_multipart_email(to, VERIFICATION_SUBJECT, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &Email,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailDeliveryError> {
        let recipient: Mailbox = to
            .as_str()
            .parse()
            .map_err(|_| EmailDeliveryError::InvalidAddress(to.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Render the text and HTML bodies of the verification email.
fn render_verification_code(
    code: &str,
    site_name: &str,
) -> Result<(String, String), askama::Error> {
    let text = VerificationCodeEmailText { code, site_name }.render()?;
    let html = VerificationCodeEmailHtml { code, site_name }.render()?;
    Ok((text, html))
}

/// Generate a 6-digit verification code.
#[must_use]
pub fn generate_verification_code() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_generate_verification_code_format() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));

            let value: u32 = code.parse().unwrap();
            assert!((100_000..1_000_000).contains(&value));
        }
    }

    #[test]
    fn test_verification_bodies_contain_code_and_site() {
        let (text, html) = render_verification_code("482913", "RouseHillHighSchool.com").unwrap();

        assert!(text.contains("Your verification code for RouseHillHighSchool.com is: 482913"));
        assert!(html.contains("<strong>482913</strong>"));
        assert!(html.contains("RouseHillHighSchool.com"));
    }

    #[test]
    fn test_html_body_escapes_site_name() {
        let (_, html) = render_verification_code("482913", "<b>Site</b>").unwrap();
        assert!(!html.contains("<b>Site</b>"));
    }

    #[tokio::test]
    async fn test_new_rejects_bad_sender_address() {
        let config = EmailConfig {
            smtp_host: "mail.spacemail.com".to_string(),
            smtp_port: 465,
            smtp_username: "contact@rousehillhighschool.com".to_string(),
            smtp_password: SecretString::from("pw"),
            from_address: "not an address".to_string(),
            from_name: "Rouse Hill High School".to_string(),
        };

        let result = EmailService::new(&config, "RouseHillHighSchool.com");
        assert!(matches!(result, Err(EmailDeliveryError::InvalidAddress(_))));
    }
}
