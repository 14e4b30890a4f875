//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ReviewRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Review, ReviewSort};
use crate::state::AppState;

/// Query parameters for the review listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// `newest` (default), `oldest` or `stars`.
    pub sort: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub site_name: String,
    pub logged_in: bool,
    pub user_email: Option<String>,
    pub sort: &'static str,
    pub reviews: Vec<Review>,
}

/// Display every review in the requested order.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let sort = ReviewSort::from_param(query.sort.as_deref());
    let reviews = ReviewRepository::new(state.db()).list(sort)?;

    let user_email = user.map(|u| u.email.into_inner());
    Ok(IndexTemplate {
        site_name: state.config().site_name.clone(),
        logged_in: user_email.is_some(),
        user_email,
        sort: sort.as_str(),
        reviews,
    })
}
