//! Authentication route handlers.
//!
//! Handles signup (standalone and on the combined login page), emailed code
//! verification, login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::Url;

use school_reviews_core::Email;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::services::auth::{AuthError, SignupRequest};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Combined login/signup form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// `login` (default) or `signup`.
    pub action: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub confirm_password: Option<String>,
}

/// Standalone signup form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub confirm_password: Option<String>,
}

/// Verification form data.
#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    #[serde(default)]
    pub code: String,
}

/// Query parameters for the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Open the signup tab when set to `signup`.
    pub tab: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Combined login/signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub site_name: String,
    pub logged_in: bool,
    pub active_tab: &'static str,
    pub email: String,
    pub login_error: Option<String>,
    pub signup_error: Option<String>,
}

/// Standalone signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub site_name: String,
    pub logged_in: bool,
    pub email: String,
    pub error: Option<String>,
}

/// Verification code page template.
#[derive(Template, WebTemplate)]
#[template(path = "verify.html")]
pub struct VerifyTemplate {
    pub site_name: String,
    pub logged_in: bool,
    pub email: String,
    /// Path the form posts back to.
    pub action: String,
    pub error: Option<String>,
}

const LOGIN_TAB: &str = "login";
const SIGNUP_TAB: &str = "signup";

impl LoginTemplate {
    fn new(state: &AppState, logged_in: bool, active_tab: &'static str) -> Self {
        Self {
            site_name: state.config().site_name.clone(),
            logged_in,
            active_tab,
            email: String::new(),
            login_error: None,
            signup_error: None,
        }
    }
}

impl VerifyTemplate {
    fn new(state: &AppState, email: &Email, action: String) -> Self {
        Self {
            site_name: state.config().site_name.clone(),
            logged_in: false,
            email: email.to_string(),
            action,
            error: None,
        }
    }
}

/// Turn an auth failure into the message shown on the form, or propagate it
/// when it is not the user's to fix.
fn form_error(err: AuthError) -> Result<String> {
    if !err.is_user_facing() {
        return Err(AppError::Auth(err));
    }

    if let AuthError::EmailDelivery(source) = &err {
        let event_id = sentry::capture_error(source);
        tracing::error!(
            error = %source,
            sentry_event_id = %event_id,
            "Failed to send verification email"
        );
    }

    Ok(err.user_message())
}

/// Remember the address awaiting verification and send the user to enter
/// their code.
async fn start_verification(session: &Session, email: &Email) -> Result<Response> {
    session.insert(session_keys::VERIFY_EMAIL, email).await?;
    Ok(Redirect::to("/verify").into_response())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the combined login/signup page.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    let tab = if query.tab.as_deref() == Some(SIGNUP_TAB) {
        SIGNUP_TAB
    } else {
        LOGIN_TAB
    };
    LoginTemplate::new(&state, user.is_some(), tab)
}

/// Handle the combined login/signup form.
///
/// `action=signup` starts a signup; anything else is a login attempt.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if form.action.as_deref() == Some(SIGNUP_TAB) {
        let request = SignupRequest {
            email: &form.email,
            password: &form.password,
            confirm_password: Some(form.confirm_password.as_deref().unwrap_or_default()),
        };

        return match state.auth().sign_up(&request).await {
            Ok(email) => start_verification(&session, &email).await,
            Err(err) => {
                let mut page = LoginTemplate::new(&state, false, SIGNUP_TAB);
                page.email = form.email.trim().to_string();
                page.signup_error = Some(form_error(err)?);
                Ok(page.into_response())
            }
        };
    }

    match state.auth().login(&form.email, &form.password) {
        Ok(user) => {
            set_current_user(&session, &CurrentUser { email: user.email.clone() }).await?;
            tracing::info!(email = %user.email, "User logged in");
            Ok(Redirect::to("/review").into_response())
        }
        Err(err) => {
            tracing::warn!(error = %err, "Login failed");
            let mut page = LoginTemplate::new(&state, false, LOGIN_TAB);
            page.email = form.email.trim().to_string();
            page.login_error = Some(form_error(err)?);
            Ok(page.into_response())
        }
    }
}

/// Log out and return to the homepage.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    Ok(Redirect::to("/"))
}

// =============================================================================
// Signup Routes
// =============================================================================

/// Display the standalone signup page.
pub async fn signup_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    SignupTemplate {
        site_name: state.config().site_name.clone(),
        logged_in: user.is_some(),
        email: String::new(),
        error: None,
    }
}

/// Handle standalone signup form submission.
#[instrument(skip(state, session, form))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let request = SignupRequest {
        email: &form.email,
        password: &form.password,
        confirm_password: form.confirm_password.as_deref(),
    };

    match state.auth().sign_up(&request).await {
        Ok(email) => start_verification(&session, &email).await,
        Err(err) => Ok(SignupTemplate {
            site_name: state.config().site_name.clone(),
            logged_in: false,
            email: form.email.trim().to_string(),
            error: Some(form_error(err)?),
        }
        .into_response()),
    }
}

// =============================================================================
// Verification Routes
// =============================================================================

/// Display the code form for the signup remembered in the session.
///
/// Without one, the visitor is sent back to signup.
pub async fn verify_page(State(state): State<AppState>, session: Session) -> Result<Response> {
    let Some(email) = session.get::<Email>(session_keys::VERIFY_EMAIL).await? else {
        return Ok(Redirect::to("/signup").into_response());
    };

    Ok(VerifyTemplate::new(&state, &email, "/verify".to_string()).into_response())
}

/// Check the submitted code for the signup remembered in the session.
#[instrument(skip(state, session, form))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<VerifyForm>,
) -> Result<Response> {
    let Some(email) = session.get::<Email>(session_keys::VERIFY_EMAIL).await? else {
        return Ok(Redirect::to("/signup").into_response());
    };

    match state.auth().verify(&email, &form.code) {
        Ok(_) => {
            session.remove::<Email>(session_keys::VERIFY_EMAIL).await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(err) => {
            let mut page = VerifyTemplate::new(&state, &email, "/verify".to_string());
            page.error = Some(form_error(err)?);
            Ok(page.into_response())
        }
    }
}

/// Display the code form for the email in the path.
pub async fn verify_email_page(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Response> {
    let email = path_email(&email)?;
    let action = verify_action(&email)?;
    Ok(VerifyTemplate::new(&state, &email, action).into_response())
}

/// Check the submitted code for the email in the path.
#[instrument(skip(state, session, form))]
pub async fn verify_email(
    State(state): State<AppState>,
    session: Session,
    Path(email): Path<String>,
    Form(form): Form<VerifyForm>,
) -> Result<Response> {
    let email = path_email(&email)?;

    match state.auth().verify(&email, &form.code) {
        Ok(_) => {
            let remembered = session.get::<Email>(session_keys::VERIFY_EMAIL).await?;
            if remembered.as_ref() == Some(&email) {
                session.remove::<Email>(session_keys::VERIFY_EMAIL).await?;
            }
            Ok(Redirect::to("/login").into_response())
        }
        Err(err) => {
            let action = verify_action(&email)?;
            let mut page = VerifyTemplate::new(&state, &email, action);
            page.error = Some(form_error(err)?);
            Ok(page.into_response())
        }
    }
}

fn path_email(raw: &str) -> Result<Email> {
    Email::normalize(raw).map_err(|_| AppError::NotFound(format!("/verify/{raw}")))
}

/// `/verify/{email}` with the email encoded as one path segment.
fn verify_action(email: &Email) -> Result<String> {
    let mut url =
        Url::parse("http://localhost/verify").map_err(|e| AppError::Internal(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| AppError::Internal("verify URL cannot hold path segments".to_string()))?
        .push(email.as_str());
    Ok(url.path().to_owned())
}
