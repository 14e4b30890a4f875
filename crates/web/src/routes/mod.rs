//! HTTP route handlers for the review site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                 - Review listing (?sort=newest|oldest|stars)
//! GET  /health           - Health check
//!
//! # Auth
//! GET  /login            - Combined login/signup page (?tab=signup)
//! POST /login            - Login, or signup when action=signup
//! GET  /signup           - Signup page
//! POST /signup           - Signup action
//! GET  /verify           - Code form for the signup in the session
//! POST /verify           - Check code
//! GET  /verify/{email}   - Code form for the email in the path
//! POST /verify/{email}   - Check code
//! GET  /logout           - Logout
//!
//! # Reviews (requires auth)
//! GET  /review           - Review form
//! POST /review           - Post review
//! ```

pub mod auth;
pub mod home;
pub mod reviews;

use axum::{
    Router,
    middleware::from_fn,
    routing::get,
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{MemoryStore, SessionManagerLayer, service::SignedCookie};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create all page routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/verify", get(auth::verify_page).post(auth::verify))
        .route(
            "/verify/{email}",
            get(auth::verify_email_page).post(auth::verify_email),
        )
        .route("/logout", get(auth::logout))
        .route("/review", get(reviews::review_page).post(reviews::submit_review))
}

/// Build the complete application: routes, session, tracing and Sentry
/// layers, bound to `state`.
pub fn app(
    state: AppState,
    session_layer: SessionManagerLayer<MemoryStore, SignedCookie>,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(from_fn(request_id_middleware))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the data files.
async fn health() -> &'static str {
    "ok"
}
