//! Review submission route handlers.
//!
//! Both handlers require a logged-in user; anonymous visitors are redirected
//! to the login page by [`RequireAuth`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use school_reviews_core::StarRating;

use crate::db::ReviewRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Review;
use crate::state::AppState;

/// Message shown when the rating is missing or out of range.
pub const INVALID_RATING_MESSAGE: &str = "Rating must be between 1 and 5 stars.";

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub name: String,
    /// Kept as text so a bad value re-renders the form instead of failing
    /// extraction.
    #[serde(default)]
    pub stars: String,
    #[serde(default)]
    pub comment: String,
    /// Present (any value) when the box is ticked.
    pub anonymous: Option<String>,
}

/// Review form template.
#[derive(Template, WebTemplate)]
#[template(path = "review.html")]
pub struct ReviewTemplate {
    pub site_name: String,
    pub logged_in: bool,
    pub name: String,
    pub comment: String,
    pub error: Option<String>,
}

/// Display the review form.
pub async fn review_page(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> impl IntoResponse {
    ReviewTemplate {
        site_name: state.config().site_name.clone(),
        logged_in: true,
        name: String::new(),
        comment: String::new(),
        error: None,
    }
}

/// Store a review and return to the homepage.
#[instrument(skip_all)]
pub async fn submit_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let rating = form
        .stars
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|stars| StarRating::new(stars).ok());

    let Some(rating) = rating else {
        tracing::debug!(stars = %form.stars, "Rejected review with invalid rating");
        return Ok(ReviewTemplate {
            site_name: state.config().site_name.clone(),
            logged_in: true,
            name: form.name,
            comment: form.comment,
            error: Some(INVALID_RATING_MESSAGE.to_string()),
        }
        .into_response());
    };

    let author = user.email;
    let review = Review::new(
        author.clone(),
        &form.name,
        rating,
        &form.comment,
        form.anonymous.is_some(),
    );
    let review_id = review.review_id;

    ReviewRepository::new(state.db()).create(review)?;

    tracing::info!(email = %author, %review_id, stars = rating.get(), "Review posted");
    Ok(Redirect::to("/").into_response())
}
