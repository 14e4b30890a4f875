//! Review records and listing order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use school_reviews_core::{Email, ReviewId, StarRating};

/// Name shown for anonymous reviews.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// A posted review. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Author's email (never shown publicly).
    pub email: Email,
    /// Display name as submitted, or [`ANONYMOUS_NAME`].
    pub name: String,
    pub review_id: ReviewId,
    /// Star count. Not range-checked for records already on disk.
    pub stars: i64,
    pub comment: String,
    #[serde(default)]
    pub anonymous: bool,
    /// Server-side creation time (UTC).
    #[serde(with = "school_reviews_core::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Review {
    /// Build a new review stamped with the current time and a fresh id.
    #[must_use]
    pub fn new(
        author: Email,
        name: &str,
        stars: StarRating,
        comment: &str,
        anonymous: bool,
    ) -> Self {
        Self::new_at(author, name, stars, comment, anonymous, Utc::now())
    }

    /// Like [`Review::new`] with an explicit timestamp.
    #[must_use]
    pub fn new_at(
        author: Email,
        name: &str,
        stars: StarRating,
        comment: &str,
        anonymous: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let name = if anonymous {
            ANONYMOUS_NAME.to_string()
        } else {
            name.trim().to_string()
        };

        Self {
            email: author,
            name,
            review_id: ReviewId::generate(),
            stars: stars.into(),
            comment: comment.trim().to_string(),
            anonymous,
            timestamp,
        }
    }

    /// The name to show next to the review.
    ///
    /// Anonymous reviews always read "Anonymous", even if the stored record
    /// carries a name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.anonymous || self.name.trim().is_empty() {
            ANONYMOUS_NAME
        } else {
            &self.name
        }
    }

    /// Creation date for display, e.g. `5 Mar 2025`.
    #[must_use]
    pub fn posted_on(&self) -> String {
        self.timestamp.format("%-d %b %Y").to_string()
    }
}

/// Listing order selected by the `sort` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    /// Most recent first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Highest rating first.
    Stars,
}

impl ReviewSort {
    /// Parse the query parameter. Missing or unknown values sort newest first.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some("oldest") => Self::Oldest,
            Some("stars") => Self::Stars,
            _ => Self::Newest,
        }
    }

    /// The query parameter value for this order.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Stars => "stars",
        }
    }

    /// Sort in place. The sort is stable, so ties keep stored order.
    pub fn apply(self, reviews: &mut [Review]) {
        match self {
            Self::Newest => reviews.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            Self::Oldest => reviews.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            Self::Stars => reviews.sort_by(|a, b| b.stars.cmp(&a.stars)),
        }
    }
}
