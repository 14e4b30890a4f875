//! Shared harness for router tests.
//!
//! Builds the full application over a [`MemoryStore`] and drives it with
//! `tower::ServiceExt::oneshot`, carrying the session cookie between
//! requests like a browser would.

#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use tower::ServiceExt;

use school_reviews_web::config::ReviewsConfig;
use school_reviews_web::db::{Database, MemoryStore};
use school_reviews_web::middleware::create_session_layer;
use school_reviews_web::routes;
use school_reviews_web::state::AppState;

pub const SESSION_SECRET: &str =
    "k7Qp2vX9mZ4rT8wL1nB6cY3hJ5dF0gS7aE2uI9oP4xV8zM1qW6tR3yN5bC0lK2jH";

pub const STUDENT_EMAIL: &str = "student@education.nsw.gov.au";
pub const STUDENT_PASSWORD: &str = "correct-horse";

/// A response with its body read to a string.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn sets_cookie(&self) -> bool {
        self.headers.contains_key(header::SET_COOKIE)
    }

    pub fn assert_redirect(&self, to: &str) {
        assert!(
            self.status.is_redirection(),
            "expected redirect to {to}, got {} with body:\n{}",
            self.status,
            self.body
        );
        assert_eq!(self.location(), Some(to));
    }
}

/// One browser session against a fresh application.
pub struct TestClient {
    app: Router,
    pub store: Arc<MemoryStore>,
    cookies: HashMap<String, String>,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        let config = ReviewsConfig::from_lookup(|key| match key {
            "REVIEWS_SESSION_SECRET" => Some(SESSION_SECRET.to_string()),
            _ => None,
        })
        .unwrap();

        let session_layer = create_session_layer(&config).unwrap();
        let state = AppState::new(config, Database::from_arc(store.clone())).unwrap();

        Self {
            app: routes::app(state, session_layer),
            store,
            cookies: HashMap::new(),
        }
    }

    /// Same application and store, but a browser with no cookies.
    pub fn fresh_browser(&self) -> Self {
        Self {
            app: self.app.clone(),
            store: self.store.clone(),
            cookies: HashMap::new(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();

        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    /// The code most recently issued for `email`.
    pub fn pending_code(&self, email: &str) -> String {
        self.store
            .pending()
            .into_iter()
            .rev()
            .find(|p| p.email.as_str() == email)
            .map(|p| p.code)
            .unwrap()
    }

    /// Sign up, verify and log in through the site's own forms.
    pub async fn sign_up_and_log_in(&mut self, email: &str, password: &str) {
        self.post_form(
            "/signup",
            &[
                ("email", email),
                ("password", password),
                ("confirm_password", password),
            ],
        )
        .await
        .assert_redirect("/verify");

        let code = self.pending_code(email);
        self.post_form("/verify", &[("code", code.as_str())])
            .await
            .assert_redirect("/login");

        self.post_form(
            "/login",
            &[("action", "login"), ("email", email), ("password", password)],
        )
        .await
        .assert_redirect("/review");
    }
}
